//! Built-in registry of artifact document types.
//!
//! Each entry carries the heading schema the comparator enforces plus the
//! repository facts other checks need: which template defines it, which agent
//! produces it, and which content rules apply. The registry is read-only;
//! a process-wide strictness override produces a new registry value instead
//! of mutating this one.

use crate::models::schema::{DocumentSchema, Strictness};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A diagram an artifact must link: the rendered image and its source.
pub struct DiagramRef {
    pub image: &'static str,
    pub source: &'static str,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Content rules beyond heading structure.
pub struct ContentRules {
    /// At least one fenced `mermaid` block.
    pub mermaid: bool,
    /// ✅, ⚠️ and ❌ status markers.
    pub traffic_light: bool,
    /// At least one `<details>` block.
    pub collapsible: bool,
    /// Cost distribution table or chart image.
    pub cost_distribution: bool,
    /// Discovery source must show real query evidence.
    pub governance_discovery: bool,
    pub diagrams: &'static [DiagramRef],
    /// Diagram links and files are also required in generated artifacts.
    pub output_diagrams: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Who writes an artifact type.
pub enum Owner {
    /// Agent file name under the agents directory.
    Agent(&'static str),
    /// The consolidated artifacts skill, which embeds every skeleton.
    ConsolidatedSkill,
    /// Written by hand.
    Manual,
}

#[derive(Debug, Clone)]
/// One registered artifact type.
pub struct ArtifactType {
    pub schema: DocumentSchema,
    /// Template file name under the templates directory.
    pub template: &'static str,
    pub owner: Owner,
    pub rules: ContentRules,
    /// Declared in the skill and heading reference documents too.
    pub synced: bool,
}

impl ArtifactType {
    pub fn name(&self) -> &str {
        &self.schema.name
    }
}

struct Def {
    name: &'static str,
    required: &'static [&'static str],
    optional: &'static [&'static str],
    strictness: Strictness,
    template: &'static str,
    owner: Owner,
    rules: ContentRules,
    synced: bool,
}

const NONE: ContentRules = ContentRules {
    mermaid: false,
    traffic_light: false,
    collapsible: false,
    cost_distribution: false,
    governance_discovery: false,
    diagrams: &[],
    output_diagrams: false,
};

const COST_ESTIMATE_HEADINGS: &[&str] = &[
    "## 💰 Cost At-a-Glance",
    "## ✅ Decision Summary",
    "## 🔁 Requirements → Cost Mapping",
    "## 📊 Top 5 Cost Drivers",
    "## Architecture Overview",
    "## 🧾 What We Are Not Paying For (Yet)",
    "## ⚠️ Cost Risk Indicators",
    "## 🎯 Quick Decision Matrix",
    "## 💰 Savings Opportunities",
    "## Detailed Cost Breakdown",
];

const REFERENCES: &[&str] = &["## References"];

const DEFS: &[Def] = &[
    Def {
        name: "01-requirements.md",
        required: &[
            "## Project Overview",
            "## Functional Requirements",
            "## Non-Functional Requirements (NFRs)",
            "## Compliance & Security Requirements",
            "## Budget",
            "## Operational Requirements",
            "## Regional Preferences",
            "## Summary for Architecture Assessment",
        ],
        optional: REFERENCES,
        strictness: Strictness::Standard,
        template: "01-requirements.template.md",
        owner: Owner::Agent("requirements.agent.md"),
        rules: ContentRules {
            mermaid: true,
            collapsible: true,
            ..NONE
        },
        synced: true,
    },
    Def {
        name: "02-architecture-assessment.md",
        required: &[
            "## Requirements Validation ✅",
            "## Executive Summary",
            "## WAF Pillar Assessment",
            "## Resource SKU Recommendations",
            "## Architecture Decision Summary",
            "## Implementation Handoff",
            "## Approval Gate",
        ],
        optional: REFERENCES,
        strictness: Strictness::Standard,
        template: "02-architecture-assessment.template.md",
        owner: Owner::Agent("architect.agent.md"),
        rules: ContentRules {
            mermaid: true,
            traffic_light: true,
            collapsible: true,
            ..NONE
        },
        synced: true,
    },
    Def {
        name: "03-des-cost-estimate.md",
        required: COST_ESTIMATE_HEADINGS,
        optional: REFERENCES,
        strictness: Strictness::Standard,
        template: "03-des-cost-estimate.template.md",
        owner: Owner::Agent("architect.agent.md"),
        rules: ContentRules {
            collapsible: true,
            cost_distribution: true,
            ..NONE
        },
        synced: true,
    },
    Def {
        name: "04-implementation-plan.md",
        required: &[
            "## Overview",
            "## Resource Inventory",
            "## Module Structure",
            "## Implementation Tasks",
            "## Deployment Phases",
            "## Dependency Graph",
            "## Runtime Flow Diagram",
            "## Naming Conventions",
            "## Security Configuration",
            "## Estimated Implementation Time",
            "## Approval Gate",
        ],
        optional: REFERENCES,
        strictness: Strictness::Standard,
        template: "04-implementation-plan.template.md",
        owner: Owner::Agent("bicep-plan.agent.md"),
        rules: ContentRules {
            diagrams: &[
                DiagramRef {
                    image: "./04-dependency-diagram.png",
                    source: "./04-dependency-diagram.py",
                },
                DiagramRef {
                    image: "./04-runtime-diagram.png",
                    source: "./04-runtime-diagram.py",
                },
            ],
            output_diagrams: true,
            ..NONE
        },
        synced: true,
    },
    Def {
        name: "04-governance-constraints.md",
        required: &[
            "## Discovery Source",
            "## Azure Policy Compliance",
            "## Plan Adaptations Based on Policies",
            "## Deployment Blockers",
            "## Required Tags",
            "## Security Policies",
            "## Cost Policies",
            "## Network Policies",
        ],
        optional: REFERENCES,
        strictness: Strictness::Standard,
        template: "04-governance-constraints.template.md",
        owner: Owner::Agent("bicep-plan.agent.md"),
        rules: ContentRules {
            mermaid: true,
            traffic_light: true,
            governance_discovery: true,
            ..NONE
        },
        synced: true,
    },
    Def {
        name: "04-preflight-check.md",
        required: &[
            "## Purpose",
            "## AVM Schema Validation Results",
            "## Parameter Type Analysis",
            "## Region Limitations Identified",
            "## Pitfalls Checklist",
            "## Ready for Implementation",
        ],
        optional: REFERENCES,
        strictness: Strictness::Standard,
        template: "04-preflight-check.template.md",
        owner: Owner::Agent("bicep-code.agent.md"),
        rules: ContentRules {
            mermaid: true,
            collapsible: true,
            ..NONE
        },
        synced: true,
    },
    Def {
        name: "05-implementation-reference.md",
        required: &[
            "## Bicep Templates Location",
            "## File Structure",
            "## Validation Status",
            "## Resources Created",
            "## Deployment Instructions",
            "## Key Implementation Notes",
        ],
        optional: &["## Next Steps", "## References"],
        strictness: Strictness::Standard,
        template: "05-implementation-reference.template.md",
        owner: Owner::Agent("bicep-code.agent.md"),
        rules: ContentRules {
            mermaid: true,
            traffic_light: true,
            collapsible: true,
            ..NONE
        },
        synced: true,
    },
    Def {
        name: "06-deployment-summary.md",
        required: &[
            "## Preflight Validation",
            "## Deployment Details",
            "## Deployed Resources",
            "## Outputs (Expected)",
            "## To Actually Deploy",
            "## Post-Deployment Tasks",
        ],
        optional: REFERENCES,
        strictness: Strictness::Standard,
        template: "06-deployment-summary.template.md",
        owner: Owner::Agent("deploy.agent.md"),
        rules: ContentRules {
            traffic_light: true,
            collapsible: true,
            ..NONE
        },
        synced: true,
    },
    Def {
        name: "07-ab-cost-estimate.md",
        required: COST_ESTIMATE_HEADINGS,
        optional: REFERENCES,
        strictness: Strictness::Standard,
        template: "07-ab-cost-estimate.template.md",
        owner: Owner::ConsolidatedSkill,
        rules: ContentRules {
            traffic_light: true,
            collapsible: true,
            cost_distribution: true,
            ..NONE
        },
        synced: true,
    },
    Def {
        name: "07-backup-dr-plan.md",
        required: &[
            "## Executive Summary",
            "## 1. Recovery Objectives",
            "## 2. Backup Strategy",
            "## 3. Disaster Recovery Procedures",
            "## 4. Testing Schedule",
            "## 5. Communication Plan",
            "## 6. Roles and Responsibilities",
            "## 7. Dependencies",
            "## 8. Recovery Runbooks",
            "## 9. Appendix",
        ],
        optional: &["## 3. Disaster Recovery Architecture", "## References"],
        strictness: Strictness::Standard,
        template: "07-backup-dr-plan.template.md",
        owner: Owner::ConsolidatedSkill,
        rules: ContentRules {
            mermaid: true,
            collapsible: true,
            ..NONE
        },
        synced: true,
    },
    Def {
        name: "07-compliance-matrix.md",
        required: &[
            "## Executive Summary",
            "## 1. Control Mapping",
            "## 2. Gap Analysis",
            "## 3. Evidence Collection",
            "## 4. Audit Trail",
            "## 5. Remediation Tracker",
            "## 6. Appendix",
        ],
        optional: &["## Security Controls Summary", "## References"],
        strictness: Strictness::Standard,
        template: "07-compliance-matrix.template.md",
        owner: Owner::ConsolidatedSkill,
        rules: ContentRules {
            mermaid: true,
            traffic_light: true,
            collapsible: true,
            ..NONE
        },
        synced: true,
    },
    Def {
        name: "07-design-document.md",
        required: &[
            "## 1. Introduction",
            "## 2. Azure Architecture Overview",
            "## 3. Networking",
            "## 4. Storage",
            "## 5. Compute",
            "## 6. Identity & Access",
            "## 7. Security & Compliance",
            "## 8. Backup & Disaster Recovery",
            "## 9. Management & Monitoring",
            "## 10. Appendix",
        ],
        optional: REFERENCES,
        strictness: Strictness::Standard,
        template: "07-design-document.template.md",
        owner: Owner::ConsolidatedSkill,
        rules: ContentRules {
            traffic_light: true,
            collapsible: true,
            diagrams: &[
                DiagramRef {
                    image: "./03-des-diagram.png",
                    source: "./03-des-diagram.py",
                },
                DiagramRef {
                    image: "./03-des-network-diagram.png",
                    source: "./03-des-network-diagram.py",
                },
            ],
            ..NONE
        },
        synced: true,
    },
    Def {
        name: "07-documentation-index.md",
        required: &[
            "## 1. Document Package Contents",
            "## 2. Source Artifacts",
            "## 3. Project Summary",
            "## 4. Related Resources",
            "## 5. Quick Links",
        ],
        optional: &["## Architecture Overview", "## References"],
        strictness: Strictness::Standard,
        template: "07-documentation-index.template.md",
        owner: Owner::ConsolidatedSkill,
        rules: ContentRules {
            mermaid: true,
            ..NONE
        },
        synced: true,
    },
    Def {
        name: "07-operations-runbook.md",
        required: &[
            "## Quick Reference",
            "## 1. Daily Operations",
            "## 2. Incident Response",
            "## 3. Common Procedures",
            "## 4. Maintenance Windows",
            "## 5. Contacts & Escalation",
            "## 6. Change Log",
        ],
        optional: REFERENCES,
        strictness: Strictness::Standard,
        template: "07-operations-runbook.template.md",
        owner: Owner::ConsolidatedSkill,
        rules: ContentRules {
            mermaid: true,
            collapsible: true,
            ..NONE
        },
        synced: true,
    },
    Def {
        name: "07-resource-inventory.md",
        required: &["## Summary", "## Resource Listing"],
        optional: &[
            "## Resource Configuration Details",
            "## Tags Applied",
            "## Resource Dependencies",
            "## Cost Summary by Resource",
            "## Cost by Resource",
            "## Private DNS Zones",
            "## IP Address Allocation",
            "## Module Summary",
            "## Validation Commands",
            "## References",
        ],
        strictness: Strictness::Standard,
        template: "07-resource-inventory.template.md",
        owner: Owner::ConsolidatedSkill,
        rules: ContentRules {
            mermaid: true,
            ..NONE
        },
        synced: true,
    },
    // Project README: content headings only, the template also has meta-headings.
    Def {
        name: "README.md",
        required: &[
            "## 📋 Project Summary",
            "## ✅ Workflow Progress",
            "## 🏛️ Architecture",
            "## 📄 Generated Artifacts",
            "## 🔗 Related Resources",
        ],
        optional: &[],
        strictness: Strictness::Relaxed,
        template: "PROJECT-README.template.md",
        owner: Owner::Manual,
        rules: NONE,
        synced: false,
    },
];

/// Headings every source may carry or omit by convention.
pub const UNIVERSAL_OPTIONAL: &[&str] = &["## References"];

/// Headings only templates carry, never generated artifacts.
pub const TEMPLATE_META_HEADINGS: &[&str] = &["## Template Instructions", "## Required Structure"];

#[derive(Debug, Clone)]
/// Read-only lookup table from document type name to its artifact type.
pub struct Registry {
    artifacts: Vec<ArtifactType>,
}

impl Registry {
    /// The built-in artifact table with per-type default strictness.
    pub fn builtin() -> Self {
        let artifacts = DEFS
            .iter()
            .map(|d| ArtifactType {
                schema: DocumentSchema::new(
                    d.name,
                    d.required.iter().copied(),
                    d.optional.iter().copied(),
                    d.strictness,
                ),
                template: d.template,
                owner: d.owner,
                rules: d.rules,
                synced: d.synced,
            })
            .collect();
        Registry { artifacts }
    }

    /// Apply a process-wide strictness that beats every per-type default.
    pub fn with_strictness_override(self, strictness: Option<Strictness>) -> Self {
        let Some(s) = strictness else {
            return self;
        };
        let artifacts = self
            .artifacts
            .into_iter()
            .map(|mut a| {
                a.schema.strictness = s;
                a
            })
            .collect();
        Registry { artifacts }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArtifactType> {
        self.artifacts.iter()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Resolve a file name or path to its artifact type.
    ///
    /// An exact file-name match wins; otherwise the longest registered name
    /// the file name ends with (`foo/bar/06-deployment-summary.md` and
    /// `x-06-deployment-summary.md` both resolve to `06-deployment-summary.md`).
    pub fn lookup(&self, name_or_path: &str) -> Option<&ArtifactType> {
        let file_name = Path::new(name_or_path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(name_or_path);
        if let Some(exact) = self.artifacts.iter().find(|a| a.name() == file_name) {
            return Some(exact);
        }
        self.artifacts
            .iter()
            .filter(|a| file_name.ends_with(a.name()))
            .max_by_key(|a| a.name().len())
    }

    pub fn schema(&self, name_or_path: &str) -> Option<&DocumentSchema> {
        self.lookup(name_or_path).map(|a| &a.schema)
    }

    /// Names declared in every independent heading source.
    pub fn synced_names(&self) -> Vec<&str> {
        self.artifacts
            .iter()
            .filter(|a| a.synced)
            .map(|a| a.name())
            .collect()
    }
}

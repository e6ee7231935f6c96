use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::fields::FieldKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    Required,
    Optional,
}

impl Requirement {
    pub fn is_required(self) -> bool {
        matches!(self, Self::Required)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub requirement: Requirement,
    /// Fixed option list for single-choice and multi-select fields; empty
    /// for text fields.
    pub options: Vec<String>,
}

/// Static metadata declaring which fields a wizard step owns for validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDescriptor {
    /// 1-based step index.
    pub index: u32,
    pub label: String,
    pub fields: Vec<FieldSpec>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("a step plan must declare at least one step")]
    Empty,
    #[error("step indices must be contiguous and 1-based: expected {expected}, found {found}")]
    NonContiguousIndex { expected: u32, found: u32 },
    #[error("field `{0}` is owned by more than one step")]
    DuplicateField(String),
    #[error("choice field `{0}` declares no options")]
    MissingOptions(String),
}

/// An ordered sequence of step descriptors. Supports arbitrary N >= 1; the
/// standard development-services intake is the six-step instance below.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPlan {
    steps: Vec<StepDescriptor>,
}

impl StepPlan {
    pub fn new(steps: Vec<StepDescriptor>) -> Result<Self, PlanError> {
        if steps.is_empty() {
            return Err(PlanError::Empty);
        }

        let mut seen_fields = std::collections::HashSet::new();
        for (position, step) in steps.iter().enumerate() {
            let expected = position as u32 + 1;
            if step.index != expected {
                return Err(PlanError::NonContiguousIndex { expected, found: step.index });
            }
            for spec in &step.fields {
                if !seen_fields.insert(spec.name.clone()) {
                    return Err(PlanError::DuplicateField(spec.name.clone()));
                }
                let needs_options =
                    matches!(spec.kind, FieldKind::SingleChoice | FieldKind::MultiSelect);
                if needs_options && spec.options.is_empty() {
                    return Err(PlanError::MissingOptions(spec.name.clone()));
                }
            }
        }

        Ok(Self { steps })
    }

    /// The six-step quote-request intake used by the development-services
    /// storefront. Consistency with `StepPlan::new` is covered by tests, so
    /// this construction is infallible.
    pub fn standard() -> Self {
        Self { steps: standard_steps() }
    }

    pub fn total_steps(&self) -> u32 {
        self.steps.len() as u32
    }

    pub fn descriptor(&self, index: u32) -> Option<&StepDescriptor> {
        index.checked_sub(1).and_then(|offset| self.steps.get(offset as usize))
    }

    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    pub fn field_specs(&self) -> impl Iterator<Item = &FieldSpec> {
        self.steps.iter().flat_map(|step| step.fields.iter())
    }

    pub fn spec_for(&self, field: &str) -> Option<&FieldSpec> {
        self.field_specs().find(|spec| spec.name == field)
    }
}

struct FieldTemplate {
    name: &'static str,
    label: &'static str,
    kind: FieldKind,
    required: bool,
    options: &'static [&'static str],
}

struct StepTemplate {
    label: &'static str,
    fields: &'static [FieldTemplate],
}

const STANDARD_PLAN: &[StepTemplate] = &[
    StepTemplate {
        label: "Contact",
        fields: &[
            FieldTemplate {
                name: "name",
                label: "Full name",
                kind: FieldKind::Text,
                required: true,
                options: &[],
            },
            FieldTemplate {
                name: "email",
                label: "Email address",
                kind: FieldKind::Email,
                required: true,
                options: &[],
            },
            FieldTemplate {
                name: "phone",
                label: "Phone number",
                kind: FieldKind::Text,
                required: true,
                options: &[],
            },
            FieldTemplate {
                name: "company",
                label: "Company",
                kind: FieldKind::Text,
                required: false,
                options: &[],
            },
        ],
    },
    StepTemplate {
        label: "Project",
        fields: &[
            FieldTemplate {
                name: "project_type",
                label: "Project type",
                kind: FieldKind::MultiSelect,
                required: true,
                options: &[
                    "website",
                    "web_app",
                    "ecommerce",
                    "mobile_app",
                    "redesign",
                    "maintenance",
                ],
            },
            FieldTemplate {
                name: "industry",
                label: "Industry",
                kind: FieldKind::SingleChoice,
                required: false,
                options: &[
                    "technology",
                    "retail",
                    "healthcare",
                    "finance",
                    "education",
                    "hospitality",
                    "nonprofit",
                    "other",
                ],
            },
        ],
    },
    StepTemplate {
        label: "Features",
        fields: &[
            FieldTemplate {
                name: "features",
                label: "Features",
                kind: FieldKind::MultiSelect,
                required: true,
                options: &[
                    "cms",
                    "blog",
                    "booking",
                    "payments",
                    "user_accounts",
                    "search",
                    "multilingual",
                    "analytics",
                ],
            },
            FieldTemplate {
                name: "integrations",
                label: "Integrations",
                kind: FieldKind::MultiSelect,
                required: false,
                options: &[
                    "crm",
                    "email_marketing",
                    "payment_gateway",
                    "social_media",
                    "shipping",
                    "erp",
                ],
            },
        ],
    },
    StepTemplate {
        label: "Platforms",
        fields: &[
            FieldTemplate {
                name: "platforms",
                label: "Target platforms",
                kind: FieldKind::MultiSelect,
                required: true,
                options: &["desktop_web", "mobile_web", "ios", "android"],
            },
            FieldTemplate {
                name: "hosting_preference",
                label: "Hosting preference",
                kind: FieldKind::SingleChoice,
                required: false,
                options: &["managed_vps", "shared", "cloud", "on_premise", "undecided"],
            },
        ],
    },
    StepTemplate {
        label: "Schedule & budget",
        fields: &[
            FieldTemplate {
                name: "timeline",
                label: "Timeline",
                kind: FieldKind::SingleChoice,
                required: true,
                options: &["asap", "one_to_three_months", "three_to_six_months", "flexible"],
            },
            FieldTemplate {
                name: "budget",
                label: "Budget",
                kind: FieldKind::SingleChoice,
                required: true,
                options: &["under_5k", "5k_to_15k", "15k_to_50k", "above_50k"],
            },
        ],
    },
    StepTemplate {
        label: "Project details",
        fields: &[
            FieldTemplate {
                name: "description",
                label: "Project description",
                kind: FieldKind::Text,
                required: true,
                options: &[],
            },
            FieldTemplate {
                name: "existing_website",
                label: "Existing website",
                kind: FieldKind::Text,
                required: false,
                options: &[],
            },
            FieldTemplate {
                name: "referral_source",
                label: "How did you hear about us",
                kind: FieldKind::SingleChoice,
                required: false,
                options: &["search", "social", "referral", "advertisement", "other"],
            },
        ],
    },
];

fn standard_steps() -> Vec<StepDescriptor> {
    STANDARD_PLAN
        .iter()
        .enumerate()
        .map(|(position, template)| StepDescriptor {
            index: position as u32 + 1,
            label: template.label.to_owned(),
            fields: template
                .fields
                .iter()
                .map(|field| FieldSpec {
                    name: field.name.to_owned(),
                    label: field.label.to_owned(),
                    kind: field.kind,
                    requirement: if field.required {
                        Requirement::Required
                    } else {
                        Requirement::Optional
                    },
                    options: field.options.iter().map(|option| (*option).to_owned()).collect(),
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::domain::fields::FieldKind;
    use crate::wizard::plan::{
        standard_steps, FieldSpec, PlanError, Requirement, StepDescriptor, StepPlan,
    };

    fn text_field(name: &str) -> FieldSpec {
        FieldSpec {
            name: name.to_owned(),
            label: name.to_owned(),
            kind: FieldKind::Text,
            requirement: Requirement::Required,
            options: Vec::new(),
        }
    }

    #[test]
    fn standard_plan_passes_plan_validation() {
        let plan = StepPlan::new(standard_steps()).expect("standard plan is consistent");
        assert_eq!(plan.total_steps(), 6);
        assert_eq!(plan.descriptor(1).map(|step| step.label.as_str()), Some("Contact"));
        assert_eq!(plan, StepPlan::standard());
    }

    #[test]
    fn standard_plan_owns_the_expected_gate_fields() {
        let plan = StepPlan::standard();

        let contact = plan.descriptor(1).expect("step 1");
        let required: Vec<&str> = contact
            .fields
            .iter()
            .filter(|spec| spec.requirement.is_required())
            .map(|spec| spec.name.as_str())
            .collect();
        assert_eq!(required, vec!["name", "email", "phone"]);

        let project = plan.descriptor(2).expect("step 2");
        assert!(project
            .fields
            .iter()
            .any(|spec| spec.name == "project_type" && spec.requirement.is_required()));
    }

    #[test]
    fn empty_plans_are_rejected() {
        assert_eq!(StepPlan::new(Vec::new()), Err(PlanError::Empty));
    }

    #[test]
    fn non_contiguous_indices_are_rejected() {
        let steps = vec![
            StepDescriptor { index: 1, label: "One".to_owned(), fields: vec![text_field("a")] },
            StepDescriptor { index: 3, label: "Three".to_owned(), fields: vec![text_field("b")] },
        ];
        assert_eq!(
            StepPlan::new(steps),
            Err(PlanError::NonContiguousIndex { expected: 2, found: 3 })
        );
    }

    #[test]
    fn a_field_owned_by_two_steps_is_rejected() {
        let steps = vec![
            StepDescriptor { index: 1, label: "One".to_owned(), fields: vec![text_field("a")] },
            StepDescriptor { index: 2, label: "Two".to_owned(), fields: vec![text_field("a")] },
        ];
        assert_eq!(StepPlan::new(steps), Err(PlanError::DuplicateField("a".to_owned())));
    }

    #[test]
    fn choice_fields_must_declare_options() {
        let steps = vec![StepDescriptor {
            index: 1,
            label: "One".to_owned(),
            fields: vec![FieldSpec {
                name: "industry".to_owned(),
                label: "Industry".to_owned(),
                kind: FieldKind::SingleChoice,
                requirement: Requirement::Optional,
                options: Vec::new(),
            }],
        }];
        assert_eq!(StepPlan::new(steps), Err(PlanError::MissingOptions("industry".to_owned())));
    }

    #[test]
    fn single_step_plans_are_supported() {
        let plan = StepPlan::new(vec![StepDescriptor {
            index: 1,
            label: "Only".to_owned(),
            fields: vec![text_field("a")],
        }])
        .expect("single-step plan");
        assert_eq!(plan.total_steps(), 1);
    }
}

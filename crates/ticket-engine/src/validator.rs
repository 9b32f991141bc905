//! Template validation: run this before storing or using a template.
//!
//! Checks, in order (the first failure is returned):
//! 1. The start step is named and the step list is non-empty.
//! 2. Every step has an identifier, a known sign type, a joint sign rate in
//!    `[0, 1]` when jointly signed, and edges iff it is not an end step.
//!    Identifiers are unique.
//! 3. The start step is defined.
//! 4. Breadth-first traversal from the start step resolves every edge and
//!    visits every defined step.
//!
//! A template that passes is wrapped in [`ValidatedTemplate`], the only form
//! the approval engine accepts through its convenience API.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::models::{SignType, Step, Template};
use crate::TemplateError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning knobs for the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Sign types a template may use; anything else is `BadSignType`.
    pub allowed_sign_types: HashSet<SignType>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            allowed_sign_types: SignType::ALL.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Structural checker for templates.  Never mutates its input.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate the template's step graph.
    ///
    /// # Errors
    /// Returns the first [`TemplateError`] encountered, see the module docs
    /// for the order of checks.
    #[instrument(skip_all, fields(template = %template.uid))]
    pub fn validate(&self, template: &Template) -> Result<(), TemplateError> {
        match self.check(template) {
            Ok(()) => {
                debug!("template '{}' is valid ({} steps)", template.uid, template.steps.len());
                Ok(())
            }
            Err(e) => {
                warn!("template '{}' rejected: {}", template.uid, e);
                Err(e)
            }
        }
    }

    fn check(&self, template: &Template) -> Result<(), TemplateError> {
        if template.start_step.is_empty() {
            return Err(TemplateError::StartStepEmpty);
        }
        if template.steps.is_empty() {
            return Err(TemplateError::ConfigEmpty);
        }

        let end_steps: HashSet<&str> = template.end_step.iter().map(String::as_str).collect();
        let mut step_map: HashMap<&str, &Step> = HashMap::with_capacity(template.steps.len());

        for step in &template.steps {
            self.check_step(step, &end_steps)?;
            if step_map.insert(step.step.as_str(), step).is_some() {
                return Err(TemplateError::DuplicateStep(step.step.clone()));
            }
        }

        if !step_map.contains_key(template.start_step.as_str()) {
            return Err(TemplateError::StartStepNotFound(template.start_step.clone()));
        }

        check_reachability(template, &step_map, &end_steps)
    }

    fn check_step(&self, step: &Step, end_steps: &HashSet<&str>) -> Result<(), TemplateError> {
        if step.step.is_empty() {
            return Err(TemplateError::BadStepConfig);
        }

        let is_end = end_steps.contains(step.step.as_str());
        if step.next.is_empty() && !is_end {
            return Err(TemplateError::NextStepEmpty(step.step.clone()));
        }

        self.check_disposal(step)?;

        if is_end && !step.next.is_empty() {
            return Err(TemplateError::EndStepHasNext(step.step.clone()));
        }

        Ok(())
    }

    /// Sign type is known and allowed; the rate is in `[0, 1]` when jointly
    /// signed.
    pub(crate) fn check_disposal(&self, step: &Step) -> Result<SignType, TemplateError> {
        let kind = step
            .disposal
            .kind()
            .filter(|kind| self.config.allowed_sign_types.contains(kind))
            .ok_or_else(|| TemplateError::BadSignType {
                step: step.step.clone(),
                sign_type: step.disposal.sign_type.clone(),
            })?;

        if kind == SignType::JointlySign && !(0.0..=1.0).contains(&step.disposal.joint_sign_rate) {
            return Err(TemplateError::BadJointSignRate {
                step: step.step.clone(),
                rate: step.disposal.joint_sign_rate,
            });
        }

        Ok(kind)
    }
}

/// Validate with the default configuration.
pub fn validate_template(template: &Template) -> Result<(), TemplateError> {
    Validator::default().validate(template)
}

/// Breadth-first walk from the start step.  End steps are visited but not
/// expanded.
fn check_reachability(
    template: &Template,
    step_map: &HashMap<&str, &Step>,
    end_steps: &HashSet<&str>,
) -> Result<(), TemplateError> {
    let mut visited: HashSet<&str> = HashSet::with_capacity(step_map.len());
    let mut queue: VecDeque<&str> = VecDeque::with_capacity(step_map.len());
    queue.push_back(template.start_step.as_str());

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current) {
            continue;
        }

        let Some(step) = step_map.get(current) else {
            return Err(TemplateError::UnreachableSteps(vec![current.to_owned()]));
        };

        if end_steps.contains(current) {
            continue;
        }

        for next in &step.next {
            if next.step.is_empty() {
                return Err(TemplateError::BadNextStep(step.step.clone()));
            }
            queue.push_back(next.step.as_str());
        }
    }

    if visited.len() < step_map.len() {
        let unvisited = template
            .steps
            .iter()
            .filter(|s| !visited.contains(s.step.as_str()))
            .map(|s| s.step.clone())
            .collect();
        return Err(TemplateError::UnreachableSteps(unvisited));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// ValidatedTemplate
// ---------------------------------------------------------------------------

/// A template that passed validation, with its step lookup precomputed.
///
/// Only constructible through validation, so holders may rely on the graph
/// being total and unambiguous.  Immutable and safe to share read-only
/// across any number of tickets.
#[derive(Debug, Clone)]
pub struct ValidatedTemplate {
    template: Template,
    steps: HashMap<String, Step>,
    end_steps: HashSet<String>,
}

impl ValidatedTemplate {
    /// Validate with the default configuration.
    pub fn new(template: Template) -> Result<Self, TemplateError> {
        Self::with_validator(template, &Validator::default())
    }

    pub fn with_validator(template: Template, validator: &Validator) -> Result<Self, TemplateError> {
        validator.validate(&template)?;

        let steps = template
            .steps
            .iter()
            .map(|s| (s.step.clone(), s.clone()))
            .collect();
        let end_steps = template.end_step.iter().cloned().collect();

        Ok(Self { template, steps, end_steps })
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn uid(&self) -> &str {
        &self.template.uid
    }

    pub fn start_step(&self) -> &str {
        &self.template.start_step
    }

    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.get(id)
    }

    pub fn steps(&self) -> &HashMap<String, Step> {
        &self.steps
    }

    pub fn end_steps(&self) -> &HashSet<String> {
        &self.end_steps
    }

    pub fn is_end_step(&self, id: &str) -> bool {
        self.end_steps.contains(id)
    }

    pub fn into_inner(self) -> Template {
        self.template
    }
}

impl TryFrom<Template> for ValidatedTemplate {
    type Error = TemplateError;

    fn try_from(template: Template) -> Result<Self, Self::Error> {
        Self::new(template)
    }
}

//! HorizontalPodAutoscaler resource

use super::validation::validate_name;
use super::{ResourceKind, ResourceMeta, Target};
use crate::Error;

/// Default CPU utilization threshold, in percent
pub const DEFAULT_CPU_PERCENT: i32 = 80;

/// Scales a workload between two replica bounds on CPU utilization
#[derive(Clone, Debug)]
pub struct HorizontalPodAutoscaler {
    /// Identity and metadata
    pub meta: ResourceMeta,
    /// Workload being scaled
    pub target: Target,
    /// Lower replica bound
    pub min_replicas: i32,
    /// Upper replica bound
    pub max_replicas: i32,
    /// Average CPU utilization target, 0..=100
    pub cpu_percent: i32,
}

impl HorizontalPodAutoscaler {
    /// Create an autoscaler, rejecting inconsistent bounds immediately
    ///
    /// Fields changed afterwards are checked again at compile time.
    pub fn new(
        name: impl Into<String>,
        target: impl Into<Target>,
        min_replicas: i32,
        max_replicas: i32,
    ) -> crate::Result<Self> {
        let hpa = Self {
            meta: ResourceMeta::new(name),
            target: target.into(),
            min_replicas,
            max_replicas,
            cpu_percent: DEFAULT_CPU_PERCENT,
        };
        hpa.validate()?;
        Ok(hpa)
    }

    /// Set the CPU utilization target
    pub fn with_cpu_percent(mut self, cpu_percent: i32) -> Self {
        self.cpu_percent = cpu_percent;
        self
    }

    /// Check every invariant of the current field values
    pub fn validate(&self) -> crate::Result<()> {
        self.meta.validate(ResourceKind::HorizontalPodAutoscaler)?;
        self.check().map_err(|c| {
            Error::configuration(ResourceKind::HorizontalPodAutoscaler.as_str(), self.name(), c)
        })
    }

    fn check(&self) -> Result<(), String> {
        validate_name("target", &self.target.name())?;
        if self.min_replicas < 0 {
            return Err(format!(
                "minReplicas must not be negative (got {})",
                self.min_replicas
            ));
        }
        if self.min_replicas > self.max_replicas {
            return Err(format!(
                "minReplicas ({}) must not exceed maxReplicas ({})",
                self.min_replicas, self.max_replicas
            ));
        }
        if !(0..=100).contains(&self.cpu_percent) {
            return Err(format!(
                "cpuPercent must be between 0 and 100 (got {})",
                self.cpu_percent
            ));
        }
        Ok(())
    }
}

impl_meta_builders!(HorizontalPodAutoscaler);

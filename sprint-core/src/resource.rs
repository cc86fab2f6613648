//! Operators and machines: the two capacity-bearing resources.
//!
//! Both are owned outside the engine; only `is_active` and the weekly
//! capacity matter here.

use serde::{Deserialize, Serialize};

pub type OperatorId = u64;
pub type MachineId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: OperatorId,
    pub full_name: String,
    pub is_active: bool,
    pub weekly_capacity_hours: u32,
}

impl Operator {
    pub fn new(id: OperatorId, full_name: impl Into<String>, weekly_capacity_hours: u32) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            is_active: true,
            weekly_capacity_hours,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub id: MachineId,
    pub name: String,
    pub is_active: bool,
    pub weekly_capacity_hours: u32,
}

impl Machine {
    pub fn new(id: MachineId, name: impl Into<String>, weekly_capacity_hours: u32) -> Self {
        Self {
            id,
            name: name.into(),
            is_active: true,
            weekly_capacity_hours,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Read side shared by both resource kinds.
pub trait CapacityResource {
    fn resource_id(&self) -> u64;
    fn display_name(&self) -> &str;
    fn is_active(&self) -> bool;
    fn weekly_capacity_hours(&self) -> u32;
}

impl CapacityResource for Operator {
    fn resource_id(&self) -> u64 {
        self.id
    }
    fn display_name(&self) -> &str {
        &self.full_name
    }
    fn is_active(&self) -> bool {
        self.is_active
    }
    fn weekly_capacity_hours(&self) -> u32 {
        self.weekly_capacity_hours
    }
}

impl CapacityResource for Machine {
    fn resource_id(&self) -> u64 {
        self.id
    }
    fn display_name(&self) -> &str {
        &self.name
    }
    fn is_active(&self) -> bool {
        self.is_active
    }
    fn weekly_capacity_hours(&self) -> u32 {
        self.weekly_capacity_hours
    }
}

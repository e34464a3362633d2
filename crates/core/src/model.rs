//! Plan document model
//!
//! A [`Plan`] is a root document that embeds its cost shares and an ordered
//! list of [`LinkedPlanService`] entries, each of which embeds a
//! [`LinkedService`] and its own cost shares. Every embedded object carries an
//! `objectId` and is also persisted as an independent record under that id.
//!
//! ## Wire Format
//!
//! Field names follow the client JSON exactly (`objectId`, `_org`,
//! `planserviceCostShares`, ...). Struct field order is the serialization
//! order, which makes the serialized form canonical for fingerprinting.
//!
//! ## Decoding
//!
//! Decoding is lenient: absent fields take their zero value so that partial
//! documents (patch bodies) decode. Completeness is checked separately with
//! [`Plan::validate`].

use crate::error::{Error, Result};
use crate::types::ObjectKind;
use serde::{Deserialize, Serialize};

/// Optional join metadata attached to indexed documents
pub type PlanJoin = serde_json::Map<String, serde_json::Value>;

// =============================================================================
// Leaf entities
// =============================================================================

/// Deductible and copay for a plan or a plan service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CostShares {
    /// Deductible amount
    pub deductible: i64,
    /// Copay amount
    pub copay: i64,
    /// Globally unique identifier
    pub object_id: String,
    /// Type tag (`membercostshare`)
    pub object_type: String,
    /// Owning organization
    #[serde(rename = "_org")]
    pub org: String,
    /// Join metadata
    #[serde(rename = "plan_join", skip_serializing_if = "Option::is_none")]
    pub plan_join: Option<PlanJoin>,
}

/// Cost shares embedded at the plan level
pub type PlanCostShares = CostShares;

/// Cost shares embedded in a linked plan service
pub type PlanServiceCostShares = CostShares;

impl CostShares {
    /// Overwrite every field carried by a patch body
    ///
    /// Join metadata is left as stored.
    pub fn update_from(&mut self, other: &CostShares) {
        self.deductible = other.deductible;
        self.copay = other.copay;
        self.object_id = other.object_id.clone();
        self.object_type = other.object_type.clone();
        self.org = other.org.clone();
    }
}

/// A service that a plan covers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkedService {
    /// Service name
    pub name: String,
    /// Globally unique identifier
    pub object_id: String,
    /// Type tag (`service`)
    pub object_type: String,
    /// Owning organization
    #[serde(rename = "_org")]
    pub org: String,
    /// Join metadata
    #[serde(rename = "plan_join", skip_serializing_if = "Option::is_none")]
    pub plan_join: Option<PlanJoin>,
}

// =============================================================================
// Composite entities
// =============================================================================

/// A service entry of a plan
///
/// Owns its service and cost shares by value in the document; both are also
/// persisted as independent records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkedPlanService {
    /// The covered service
    pub linked_service: LinkedService,
    /// Cost shares for this service
    #[serde(rename = "planserviceCostShares")]
    pub plan_service_cost_shares: PlanServiceCostShares,
    /// Globally unique identifier
    pub object_id: String,
    /// Type tag (`planservice`)
    pub object_type: String,
    /// Owning organization
    #[serde(rename = "_org")]
    pub org: String,
    /// Join metadata
    #[serde(rename = "plan_join", skip_serializing_if = "Option::is_none")]
    pub plan_join: Option<PlanJoin>,
}

/// Root plan document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Plan {
    /// Plan-level cost shares
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_cost_shares: Option<PlanCostShares>,
    /// Service entries, ordered; unique by `objectId`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub linked_plan_services: Vec<LinkedPlanService>,
    /// Creation date as supplied by the client
    pub creation_date: String,
    /// Globally unique identifier
    pub object_id: String,
    /// Type tag (`plan`)
    pub object_type: String,
    /// Owning organization
    #[serde(rename = "_org")]
    pub org: String,
    /// Join metadata
    #[serde(rename = "plan_join", skip_serializing_if = "Option::is_none")]
    pub plan_join: Option<PlanJoin>,
}

impl Plan {
    /// Identifier of the plan-level cost shares, if any
    pub fn cost_shares_id(&self) -> Option<&str> {
        self.plan_cost_shares.as_ref().map(|cs| cs.object_id.as_str())
    }

    /// Position of the service entry with the given identifier
    pub fn position_of_service(&self, object_id: &str) -> Option<usize> {
        self.linked_plan_services
            .iter()
            .position(|lps| lps.object_id == object_id)
    }

    /// Whether this decoded record is a root plan rather than a sub-object
    ///
    /// Sub-object records decode as a `Plan` with most fields empty; a root
    /// has an id, a plan type tag and identified cost shares.
    pub fn is_root_record(&self) -> bool {
        !self.object_id.is_empty()
            && !self.object_type.is_empty()
            && ObjectKind::from_tag(&self.object_type) == ObjectKind::Plan
            && self.cost_shares_id().is_some_and(|id| !id.is_empty())
    }

    /// Check that every required field of a full document is present
    ///
    /// Used for create and wholesale replace. Patch bodies are partial and
    /// are not validated.
    pub fn validate(&self) -> Result<()> {
        require("objectId", &self.object_id)?;
        require("objectType", &self.object_type)?;
        require("_org", &self.org)?;
        require("creationDate", &self.creation_date)?;

        if let Some(cs) = &self.plan_cost_shares {
            validate_cost_shares("planCostShares", cs)?;
        }

        for (i, lps) in self.linked_plan_services.iter().enumerate() {
            let at = |field: &str| format!("linkedPlanServices[{}].{}", i, field);
            require(&at("objectId"), &lps.object_id)?;
            require(&at("objectType"), &lps.object_type)?;
            require(&at("_org"), &lps.org)?;

            let ls = &lps.linked_service;
            require(&at("linkedService.name"), &ls.name)?;
            require(&at("linkedService.objectId"), &ls.object_id)?;
            require(&at("linkedService.objectType"), &ls.object_type)?;
            require(&at("linkedService._org"), &ls.org)?;

            validate_cost_shares(&at("planserviceCostShares"), &lps.plan_service_cost_shares)?;
        }

        Ok(())
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidDocument(format!("{} is required", field)));
    }
    Ok(())
}

fn validate_cost_shares(path: &str, cs: &CostShares) -> Result<()> {
    require(&format!("{}.objectId", path), &cs.object_id)?;
    require(&format!("{}.objectType", path), &cs.object_type)?;
    require(&format!("{}._org", path), &cs.org)
}

// =============================================================================
// StoredObject - type-tag polymorphic record
// =============================================================================

/// Any record readable from the flat namespace
///
/// The variant is chosen by the record's `objectType` tag, not by probing
/// which fields are present. Serializes as the inner document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StoredObject {
    /// Root plan
    Plan(Plan),
    /// Cost shares record (`membercostshare`)
    PlanCostShares(PlanCostShares),
    /// Linked service record
    LinkedService(LinkedService),
    /// Linked plan service record
    LinkedPlanService(LinkedPlanService),
    /// Cost shares explicitly tagged as plan-service cost shares
    PlanServiceCostShares(PlanServiceCostShares),
}

#[derive(Deserialize)]
struct TypeProbe {
    #[serde(rename = "objectType", default)]
    object_type: String,
}

impl StoredObject {
    /// Decode a stored record, dispatching on its `objectType` tag
    ///
    /// # Errors
    ///
    /// `Serialization` if the value is not a JSON object of the tagged shape.
    pub fn decode(raw: &str) -> Result<Self> {
        let probe: TypeProbe = serde_json::from_str(raw)?;
        let object = match ObjectKind::from_tag(&probe.object_type) {
            ObjectKind::Plan => StoredObject::Plan(serde_json::from_str(raw)?),
            ObjectKind::PlanCostShares => StoredObject::PlanCostShares(serde_json::from_str(raw)?),
            ObjectKind::LinkedService => StoredObject::LinkedService(serde_json::from_str(raw)?),
            ObjectKind::LinkedPlanService => {
                StoredObject::LinkedPlanService(serde_json::from_str(raw)?)
            }
            ObjectKind::PlanServiceCostShares => {
                StoredObject::PlanServiceCostShares(serde_json::from_str(raw)?)
            }
        };
        Ok(object)
    }

    /// Kind of this record
    pub fn kind(&self) -> ObjectKind {
        match self {
            StoredObject::Plan(_) => ObjectKind::Plan,
            StoredObject::PlanCostShares(_) => ObjectKind::PlanCostShares,
            StoredObject::LinkedService(_) => ObjectKind::LinkedService,
            StoredObject::LinkedPlanService(_) => ObjectKind::LinkedPlanService,
            StoredObject::PlanServiceCostShares(_) => ObjectKind::PlanServiceCostShares,
        }
    }

    /// Identifier of this record
    pub fn object_id(&self) -> &str {
        match self {
            StoredObject::Plan(p) => &p.object_id,
            StoredObject::PlanCostShares(cs) | StoredObject::PlanServiceCostShares(cs) => {
                &cs.object_id
            }
            StoredObject::LinkedService(ls) => &ls.object_id,
            StoredObject::LinkedPlanService(lps) => &lps.object_id,
        }
    }

    /// The plan, if this record is a root
    pub fn into_plan(self) -> Option<Plan> {
        match self {
            StoredObject::Plan(plan) => Some(plan),
            _ => None,
        }
    }
}

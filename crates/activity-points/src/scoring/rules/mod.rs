//! Declarative activity-points rule table.
//!
//! A table is an ordered list of categories, each with an ordered list of sub-types.
//! Order is significant: the matcher walks categories and sub-types in declared order
//! and the first predicate that succeeds wins. Tables are validated once when loaded and
//! are immutable afterwards.

mod standard;

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::activities::{ActivityLevel, ActivityType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubTypeId(pub u16);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SubTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the keyword and type tests of a predicate combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateJoin {
    /// Every non-empty test must pass.
    #[default]
    All,
    /// At least one non-empty test must pass.
    Any,
}

/// Predicate descriptor: keyword search over the record text plus type membership.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchPredicate {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activity_types: Vec<ActivityType>,
    #[serde(default)]
    pub join: PredicateJoin,
}

impl MatchPredicate {
    pub fn keywords(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|keyword| keyword.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn types(types: &[ActivityType]) -> Self {
        Self {
            activity_types: types.to_vec(),
            ..Self::default()
        }
    }

    pub fn with_types(mut self, types: &[ActivityType]) -> Self {
        self.activity_types = types.to_vec();
        self
    }

    pub fn any(mut self) -> Self {
        self.join = PredicateJoin::Any;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.activity_types.is_empty()
    }

    /// `text` must already be lowercased; keywords are normalised when the table loads.
    pub(crate) fn evaluate(&self, text: &str, activity_type: &ActivityType) -> bool {
        let keyword_hit = self
            .keywords
            .iter()
            .any(|keyword| text.contains(keyword.as_str()));
        let type_hit = self
            .activity_types
            .iter()
            .any(|candidate| candidate.same_as(activity_type));

        match self.join {
            PredicateJoin::All => {
                !self.is_empty()
                    && (self.keywords.is_empty() || keyword_hit)
                    && (self.activity_types.is_empty() || type_hit)
            }
            PredicateJoin::Any => keyword_hit || type_hit,
        }
    }

    fn normalize(&mut self) {
        self.keywords = self
            .keywords
            .iter()
            .map(|keyword| keyword.trim().to_lowercase())
            .filter(|keyword| !keyword.is_empty())
            .collect();
    }
}

/// Refinement within a category with its own per-unit points and optional finer cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTypeRule {
    pub sub_id: SubTypeId,
    pub label: String,
    pub points_per_unit: u32,
    /// Cap on the sub-type's aggregate; `None` means the category cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_points: Option<u32>,
    /// Set on every sub-type of a level-tiered category and on none of the others.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<ActivityLevel>,
    #[serde(default, skip_serializing_if = "MatchPredicate::is_empty")]
    pub predicate: MatchPredicate,
}

/// Top-level activity classification carrying an aggregate point cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCategory {
    pub category_id: CategoryId,
    pub label: String,
    pub max_points: u32,
    /// Gate shared by every sub-type, typically used by level-tiered categories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<MatchPredicate>,
    pub sub_types: Vec<SubTypeRule>,
}

impl RuleCategory {
    pub fn sub_type(&self, sub_id: SubTypeId) -> Option<&SubTypeRule> {
        self.sub_types.iter().find(|sub| sub.sub_id == sub_id)
    }

    pub fn is_level_tiered(&self) -> bool {
        self.sub_types.iter().any(|sub| sub.level.is_some())
    }

    /// Effective aggregate cap for one sub-type.
    pub fn sub_type_cap(&self, sub: &SubTypeRule) -> u32 {
        sub.max_points.unwrap_or(self.max_points)
    }

    /// Cheapest tier, used when a level disagreement is scored leniently.
    pub fn lowest_tier(&self) -> Option<&SubTypeRule> {
        self.sub_types
            .iter()
            .filter(|sub| sub.level.is_some())
            .min_by_key(|sub| sub.points_per_unit)
    }
}

/// Serialized form of a rule table, as stored in configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTableDocument {
    pub version: String,
    pub fallback_category: CategoryId,
    pub categories: Vec<RuleCategory>,
}

/// Validated, immutable rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleTable {
    version: String,
    fallback_category: CategoryId,
    categories: Vec<RuleCategory>,
}

impl RuleTable {
    /// The built-in ruleset shipped with the service.
    pub fn standard() -> Self {
        Self::from_document(standard::document())
            .expect("built-in rule table satisfies its invariants")
    }

    pub fn from_json_str(raw: &str) -> Result<Self, RuleTableError> {
        let document: RuleTableDocument = serde_json::from_str(raw)?;
        Self::from_document(document)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RuleTableError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| RuleTableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_document(mut document: RuleTableDocument) -> Result<Self, RuleTableError> {
        for category in &mut document.categories {
            if let Some(predicate) = category.predicate.as_mut() {
                predicate.normalize();
            }
            for sub in &mut category.sub_types {
                sub.predicate.normalize();
            }
        }

        validate(&document)?;

        Ok(Self {
            version: document.version,
            fallback_category: document.fallback_category,
            categories: document.categories,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn categories(&self) -> &[RuleCategory] {
        &self.categories
    }

    pub fn category(&self, category_id: CategoryId) -> Option<&RuleCategory> {
        self.categories
            .iter()
            .find(|category| category.category_id == category_id)
    }

    pub fn fallback(&self) -> &RuleCategory {
        // Validation guarantees the fallback exists and has a sub-type.
        self.categories
            .iter()
            .find(|category| category.category_id == self.fallback_category)
            .unwrap_or(&self.categories[0])
    }

    pub fn fallback_id(&self) -> CategoryId {
        self.fallback_category
    }

    pub fn sub_type(
        &self,
        category_id: CategoryId,
        sub_id: SubTypeId,
    ) -> Option<(&RuleCategory, &SubTypeRule)> {
        let category = self.category(category_id)?;
        let sub = category.sub_type(sub_id)?;
        Some((category, sub))
    }

    /// Table position of a `(category, sub-type)` pair, used for stable report ordering.
    pub(crate) fn position(&self, category_id: CategoryId, sub_id: SubTypeId) -> Option<(usize, usize)> {
        let category_index = self
            .categories
            .iter()
            .position(|category| category.category_id == category_id)?;
        let sub_index = self.categories[category_index]
            .sub_types
            .iter()
            .position(|sub| sub.sub_id == sub_id)?;
        Some((category_index, sub_index))
    }

    /// Upper bound on any student's total: the sum of every category cap.
    pub fn max_total(&self) -> u32 {
        self.categories
            .iter()
            .fold(0u32, |total, category| total.saturating_add(category.max_points))
    }

    pub fn to_document(&self) -> RuleTableDocument {
        RuleTableDocument {
            version: self.version.clone(),
            fallback_category: self.fallback_category,
            categories: self.categories.clone(),
        }
    }
}

fn validate(document: &RuleTableDocument) -> Result<(), RuleTableError> {
    if document.categories.is_empty() {
        return Err(RuleTableError::EmptyTable);
    }

    let fallback = document
        .categories
        .iter()
        .find(|category| category.category_id == document.fallback_category)
        .ok_or(RuleTableError::MissingFallback(document.fallback_category))?;
    if fallback.is_level_tiered() {
        return Err(RuleTableError::TieredFallback(fallback.category_id));
    }

    let mut category_ids = HashSet::new();
    for category in &document.categories {
        let id = category.category_id;
        if !category_ids.insert(id) {
            return Err(RuleTableError::DuplicateCategory(id));
        }
        if category.max_points == 0 {
            return Err(RuleTableError::ZeroCategoryCap(id));
        }
        if category.sub_types.is_empty() {
            return Err(RuleTableError::NoSubTypes(id));
        }
        // Normalisation has already dropped blank keywords.
        if category.predicate.as_ref().is_some_and(MatchPredicate::is_empty) {
            return Err(RuleTableError::EmptyCategoryGate(id));
        }

        let tiered = category.sub_types.iter().filter(|sub| sub.level.is_some()).count();
        if tiered != 0 && tiered != category.sub_types.len() {
            return Err(RuleTableError::MixedLevelTiers(id));
        }

        let mut sub_ids = HashSet::new();
        let mut levels: Vec<&ActivityLevel> = Vec::new();
        for sub in &category.sub_types {
            if !sub_ids.insert(sub.sub_id) {
                return Err(RuleTableError::DuplicateSubType {
                    category: id,
                    sub: sub.sub_id,
                });
            }

            let sub_max = category.sub_type_cap(sub);
            if sub_max > category.max_points {
                return Err(RuleTableError::SubTypeCapExceedsCategory {
                    category: id,
                    sub: sub.sub_id,
                    sub_max,
                    category_max: category.max_points,
                });
            }

            if let Some(level) = &sub.level {
                if levels.iter().any(|seen| seen.same_as(level)) {
                    return Err(RuleTableError::DuplicateTierLevel {
                        category: id,
                        level: level.label().to_string(),
                    });
                }
                levels.push(level);
            }

            let gated = category.predicate.is_some();
            if id != document.fallback_category && !gated && sub.predicate.is_empty() {
                return Err(RuleTableError::EmptyPredicate {
                    category: id,
                    sub: sub.sub_id,
                });
            }
        }
    }

    Ok(())
}

/// Configuration errors detected while loading a rule table. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum RuleTableError {
    #[error("failed to read rule table {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid rule table JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("rule table declares no categories")]
    EmptyTable,
    #[error("category {0} is declared more than once")]
    DuplicateCategory(CategoryId),
    #[error("category {0} must have a positive point cap")]
    ZeroCategoryCap(CategoryId),
    #[error("category {0} declares no sub-types")]
    NoSubTypes(CategoryId),
    #[error("category {category} declares sub-type {sub} more than once")]
    DuplicateSubType { category: CategoryId, sub: SubTypeId },
    #[error("category {category} sub-type {sub} caps at {sub_max}, above the category cap of {category_max}")]
    SubTypeCapExceedsCategory {
        category: CategoryId,
        sub: SubTypeId,
        sub_max: u32,
        category_max: u32,
    },
    #[error("category {0} mixes level tiers with untiered sub-types")]
    MixedLevelTiers(CategoryId),
    #[error("category {category} declares level '{level}' more than once")]
    DuplicateTierLevel { category: CategoryId, level: String },
    #[error("category {0} has an empty gate predicate")]
    EmptyCategoryGate(CategoryId),
    #[error("category {category} sub-type {sub} has no match predicate")]
    EmptyPredicate { category: CategoryId, sub: SubTypeId },
    #[error("fallback category {0} is not declared")]
    MissingFallback(CategoryId),
    #[error("fallback category {0} cannot be level-tiered")]
    TieredFallback(CategoryId),
}

//! Name -> index definition registry.

use std::collections::BTreeMap;

use boreas_series::SliceView;
use tracing::debug;

use crate::error::IndexError;
use crate::inputs::{CellSeries, EvalOptions, PercentileNeed, ThresholdKind, VariableThreshold, check_aligned};
use crate::percentile::{CompoundIndex, PercentileIndex};
use crate::result::{EventShape, IndexSlice, OutputUnit};
use crate::simple::{MultiIndex, SimpleIndex};
use crate::user::UserIndex;

/// Kind of an index, resolved once per run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndexKind {
    /// Single variable, no percentile.
    Simple(SimpleIndex),
    /// Two variables, no percentile.
    Multivariable(MultiIndex),
    /// Single variable against a percentile threshold.
    Percentile(PercentileIndex),
    /// Two variables against two day-of-year thresholds.
    PercentileMultivariable(CompoundIndex),
    /// User-defined index.
    User(UserIndex),
}

/// A named index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDef {
    name: String,
    kind: IndexKind,
}

impl IndexDef {
    /// Creates a definition.
    pub fn new(name: impl Into<String>, kind: IndexKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Creates a validated user index definition.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidUserIndex`] if the record is inconsistent.
    pub fn user(name: impl Into<String>, index: UserIndex) -> Result<Self, IndexError> {
        index.validate()?;
        Ok(Self::new(name, IndexKind::User(index)))
    }

    /// Returns the index name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the index kind.
    pub fn kind(&self) -> &IndexKind {
        &self.kind
    }

    /// Returns the conventional input variable names, in binding order.
    pub fn variables(&self) -> Vec<&'static str> {
        match &self.kind {
            IndexKind::Simple(i) => vec![i.variable()],
            IndexKind::Multivariable(i) => i.variables().to_vec(),
            IndexKind::Percentile(i) => vec![i.variable()],
            IndexKind::PercentileMultivariable(i) => i.variables().to_vec(),
            IndexKind::User(u) => vec![u.variable()],
        }
    }

    /// Returns the number of input variables.
    pub fn arity(&self) -> usize {
        match self.kind {
            IndexKind::Multivariable(_) | IndexKind::PercentileMultivariable(_) => 2,
            _ => 1,
        }
    }

    /// Returns the percentile threshold of each input variable.
    pub fn percentile_needs(&self) -> Vec<Option<PercentileNeed>> {
        match &self.kind {
            IndexKind::Simple(_) => vec![None],
            IndexKind::Multivariable(_) => vec![None, None],
            IndexKind::Percentile(i) => vec![Some(i.need())],
            IndexKind::PercentileMultivariable(i) => i.needs().into_iter().map(Some).collect(),
            IndexKind::User(u) => vec![u.need()],
        }
    }

    /// Returns `true` if in-base years are bootstrapped.
    pub fn needs_bootstrap(&self) -> bool {
        self.percentile_needs()
            .iter()
            .flatten()
            .any(PercentileNeed::is_bootstrapped)
    }

    /// Returns `true` if any input needs a percentile threshold.
    pub fn needs_percentiles(&self) -> bool {
        self.percentile_needs().iter().any(Option::is_some)
    }

    /// Returns `true` if a caller threshold may replace the default.
    pub fn accepts_threshold(&self) -> bool {
        match &self.kind {
            IndexKind::Simple(i) => i.accepts_threshold(),
            IndexKind::User(u) => u.accepts_threshold(),
            _ => false,
        }
    }

    /// Returns the date-of-event shape, if the index supports one.
    pub fn event_shape(&self) -> Option<EventShape> {
        match &self.kind {
            IndexKind::Simple(i) => i.event_shape(),
            IndexKind::Multivariable(_) => None,
            IndexKind::Percentile(i) => i.event_shape(),
            IndexKind::PercentileMultivariable(_) => Some(EventShape::Span),
            IndexKind::User(u) => u.event_shape(),
        }
    }

    /// Returns `true` if date-of-event arrays are produced for `options`.
    pub fn wants_events(&self, options: &EvalOptions) -> bool {
        let requested = match &self.kind {
            IndexKind::User(u) => options.date_of_event || u.date_of_event(),
            _ => options.date_of_event,
        };
        requested && self.event_shape().is_some()
    }

    /// Returns the output units given the input units of each variable.
    pub fn output_units(&self, input_units: &[&str], unit: OutputUnit) -> String {
        let first = input_units.first().copied().unwrap_or("");
        match &self.kind {
            IndexKind::Simple(i) => i.units(first),
            IndexKind::Multivariable(_) => first.to_string(),
            IndexKind::Percentile(i) => i.units(unit),
            IndexKind::PercentileMultivariable(i) => i.units(unit),
            IndexKind::User(u) => u.units(first, unit),
        }
    }

    /// Evaluates the index over one slice of every input variable.
    ///
    /// `thresholds[i]` belongs to `inputs[i]`; missing entries count as
    /// [`VariableThreshold::None`].
    ///
    /// # Errors
    ///
    /// - [`IndexError::WrongVariableCount`] if `inputs` does not match [`arity`](Self::arity)
    /// - [`IndexError::MissingThreshold`] if a needed threshold is absent or of the wrong kind
    /// - [`IndexError::ThresholdNotSupported`] for a fixed threshold the index does not accept
    /// - [`IndexError::ShapeMismatch`] if inputs or thresholds disagree in shape
    pub fn evaluate(
        &self,
        inputs: &[SliceView<'_>],
        thresholds: &[VariableThreshold<'_>],
        options: &EvalOptions,
    ) -> Result<IndexSlice, IndexError> {
        if inputs.len() != self.arity() {
            return Err(IndexError::WrongVariableCount {
                index: self.name.clone(),
                expected: self.arity(),
                got: inputs.len(),
            });
        }
        if options.fixed_threshold.is_some() && !self.accepts_threshold() {
            return Err(IndexError::ThresholdNotSupported {
                index: self.name.clone(),
            });
        }

        let mut series = Vec::with_capacity(inputs.len());
        for (position, (view, need)) in inputs.iter().zip(self.percentile_needs()).enumerate() {
            let threshold = thresholds.get(position).copied().unwrap_or(VariableThreshold::None);
            let matches = match (need.map(|n| n.kind), threshold) {
                (None, _) => true,
                (Some(ThresholdKind::DayOfYear { .. }), VariableThreshold::DayOfYear(_)) => true,
                (Some(ThresholdKind::WetDay { .. }), VariableThreshold::WetDay(_)) => true,
                _ => false,
            };
            if !matches {
                return Err(IndexError::MissingThreshold {
                    index: self.name.clone(),
                    position,
                });
            }
            series.push(CellSeries::new(view, threshold)?);
        }
        check_aligned(&series)?;

        let events = match self.event_shape() {
            Some(shape) if self.wants_events(options) => {
                Some((shape, inputs[0].dates(), inputs[0].calendar()))
            }
            _ => None,
        };
        debug!(index = %self.name, steps = inputs[0].dates().len(), "evaluating slice");

        let out = match &self.kind {
            IndexKind::Simple(i) => i.evaluate(&series[0], options.fixed_threshold, events),
            IndexKind::Multivariable(i) => i.evaluate(&series[0], &series[1]),
            IndexKind::Percentile(i) => i.evaluate(&series[0], options, events),
            IndexKind::PercentileMultivariable(i) => i.evaluate(&series[0], &series[1], options, events),
            IndexKind::User(u) => u.evaluate(&series[0], options, events),
        };
        Ok(out)
    }
}

/// Registry of index definitions keyed by case-insensitive name.
///
/// # Example
///
/// ```
/// use boreas_indices::IndexRegistry;
///
/// let registry = IndexRegistry::builtin();
/// let su = registry.get("su").unwrap();
/// assert_eq!(su.name(), "SU");
/// assert!(su.accepts_threshold());
/// ```
#[derive(Debug, Clone, Default)]
pub struct IndexRegistry {
    defs: BTreeMap<String, IndexDef>,
}

impl IndexRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in catalog.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for i in SimpleIndex::ALL {
            registry.register(IndexDef::new(i.name(), IndexKind::Simple(i)));
        }
        for i in MultiIndex::ALL {
            registry.register(IndexDef::new(i.name(), IndexKind::Multivariable(i)));
        }
        for i in PercentileIndex::ALL {
            registry.register(IndexDef::new(i.name(), IndexKind::Percentile(i)));
        }
        for i in CompoundIndex::ALL {
            registry.register(IndexDef::new(i.name(), IndexKind::PercentileMultivariable(i)));
        }
        registry
    }

    /// Adds or replaces a definition, returning the replaced one.
    pub fn register(&mut self, def: IndexDef) -> Option<IndexDef> {
        self.defs.insert(def.name().to_ascii_uppercase(), def)
    }

    /// Looks up a definition.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::UnknownIndex`] if no definition has this name.
    pub fn get(&self, name: &str) -> Result<&IndexDef, IndexError> {
        self.defs
            .get(&name.trim().to_ascii_uppercase())
            .ok_or_else(|| IndexError::UnknownIndex {
                name: name.to_string(),
            })
    }

    /// Returns the registered names, sorted case-insensitively.
    pub fn names(&self) -> Vec<&str> {
        self.defs.values().map(IndexDef::name).collect()
    }

    /// Returns the number of definitions.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Returns `true` if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Comparison, UserOperation, UserThreshold, VariableRole};

    #[test]
    fn builtin_catalog_size() {
        let r = IndexRegistry::builtin();
        assert_eq!(r.len(), 24 + 3 + 14 + 4);
        assert!(r.get("RX5DAY").is_ok());
        assert!(r.get("vdtr").is_ok());
        assert!(matches!(r.get("nope"), Err(IndexError::UnknownIndex { .. })));
    }

    #[test]
    fn arity_and_needs() {
        let r = IndexRegistry::builtin();
        assert_eq!(r.get("DTR").unwrap().arity(), 2);
        assert!(!r.get("DTR").unwrap().needs_percentiles());
        assert!(r.get("TX90p").unwrap().needs_bootstrap());
        let r95 = r.get("R95p").unwrap();
        assert!(r95.needs_percentiles());
        assert!(!r95.needs_bootstrap());
        assert_eq!(r.get("CW").unwrap().percentile_needs().len(), 2);
    }

    #[test]
    fn register_user_index() {
        let mut r = IndexRegistry::builtin();
        let user = UserIndex::new(VariableRole::Temperature, UserOperation::EventCount)
            .with_comparison(Comparison::Gt)
            .with_threshold(UserThreshold::Fixed(300.0));
        let def = IndexDef::user("hot_days", user).unwrap();
        assert!(r.register(def).is_none());
        assert!(r.get("HOT_DAYS").unwrap().accepts_threshold());

        let bad = UserIndex::new(VariableRole::Temperature, UserOperation::EventCount);
        assert!(IndexDef::user("bad", bad).is_err());
    }

    #[test]
    fn units() {
        let r = IndexRegistry::builtin();
        assert_eq!(r.get("TX").unwrap().output_units(&["K"], OutputUnit::Days), "K");
        assert_eq!(r.get("TX90p").unwrap().output_units(&["K"], OutputUnit::Percent), "%");
        assert_eq!(r.get("WSDI").unwrap().output_units(&["K"], OutputUnit::Percent), "days");
    }
}

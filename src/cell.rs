//! Typed cells: one string-settable slot per field.
//!
//! Every source writes through [`Cell::set`], which stores the raw string and
//! immediately re-runs coercion, so the typed value never lags behind the raw
//! text. A failed coercion leaves the zero value of the field's kind.

use crate::coerce;
use crate::error::StagefigError;
use crate::shape::FieldSpec;
use crate::types::Stage;
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct Cell<'a> {
    spec: &'a FieldSpec,
    raw: String,
    value: Value,
}

impl<'a> Cell<'a> {
    /// A cell seeded with the field's declared default.
    pub fn new(spec: &'a FieldSpec) -> Self {
        let mut cell = Cell {
            spec,
            raw: String::new(),
            value: coerce::zero(spec.kind()),
        };
        if let Err(e) = cell.set(spec.default_value()) {
            tracing::debug!(field = spec.name(), error = %e, "default does not coerce, using zero value");
        }
        cell
    }

    /// Store `raw` and coerce it. On error the typed value is the zero value
    /// and the raw string is still recorded.
    pub fn set(&mut self, raw: &str) -> Result<(), StagefigError> {
        self.raw = raw.to_string();
        match coerce::coerce(self.spec.kind(), raw) {
            Ok(value) => {
                self.value = value;
                Ok(())
            }
            Err(e) => {
                self.value = coerce::zero(self.spec.kind());
                Err(e)
            }
        }
    }

    /// [`set`](Self::set), logging instead of returning the advisory error.
    pub(crate) fn set_from(&mut self, stage: Stage, raw: &str) {
        match self.set(raw) {
            Ok(()) => tracing::trace!(field = self.spec.name(), %stage, "value set"),
            Err(e) => tracing::debug!(field = self.spec.name(), %stage, error = %e, "value does not coerce"),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn spec(&self) -> &'a FieldSpec {
        self.spec
    }

    pub fn name(&self) -> &'a str {
        self.spec.name()
    }
}

/// All cells of one resolution, in field declaration order.
#[derive(Debug, Clone, Default)]
pub struct Cells<'a> {
    cells: Vec<Cell<'a>>,
}

impl<'a> Cells<'a> {
    pub fn build(specs: impl IntoIterator<Item = &'a FieldSpec>) -> Self {
        Cells {
            cells: specs.into_iter().map(Cell::new).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Cell<'a>> {
        self.cells.iter().find(|c| c.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Cell<'a>> {
        self.cells.iter_mut().find(|c| c.name() == name)
    }

    /// The cell bound to flag alias `flag`, if any.
    pub fn by_flag_mut(&mut self, flag: &str) -> Option<&mut Cell<'a>> {
        self.cells
            .iter_mut()
            .find(|c| c.spec().flags().iter().any(|f| f == flag))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell<'a>> {
        self.cells.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Cell<'a>> {
        self.cells.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{Pair, Server};
    use crate::shape::Shape;
    use crate::value::{IntWidth, Json, Kind};

    #[test]
    fn new_cell_holds_coerced_default() {
        let shape = Shape::<Server>::of();
        let spec = shape.descriptor("port");
        let cell = Cell::new(&spec);
        assert_eq!(cell.raw(), "8080");
        assert_eq!(cell.value(), &Value::Uint(8080));
    }

    #[test]
    fn set_recoerces() {
        let spec = FieldSpec::new("n", Kind::Int(IntWidth::I64));
        let mut cell = Cell::new(&spec);
        cell.set("42").unwrap();
        assert_eq!(cell.value(), &Value::Int(42));
        assert_eq!(cell.raw(), "42");
    }

    #[test]
    fn failed_set_keeps_raw_and_zeroes_value() {
        let spec = FieldSpec::new("n", Kind::Int(IntWidth::I64));
        let mut cell = Cell::new(&spec);
        cell.set("7").unwrap();
        assert!(cell.set("seven").is_err());
        assert_eq!(cell.raw(), "seven");
        assert_eq!(cell.value(), &Value::Int(0));
    }

    #[test]
    fn empty_default_on_text_field_is_zero_shape() {
        let mut shape = Shape::<Server>::of();
        shape.field("pair", |s: &mut Server| &mut s.pair);
        let spec = shape.descriptor("pair");
        let cell = Cell::new(&spec);
        let pair = cell.value().downcast_ref::<Json<Pair>>().unwrap();
        assert_eq!(pair, &Json::default());
    }

    #[test]
    fn cells_lookup_by_name_and_alias() {
        let shape = Shape::<Server>::of();
        let specs: Vec<FieldSpec> = shape.specs().cloned().collect();
        let mut cells = Cells::build(&specs);
        assert_eq!(cells.len(), shape.len());
        assert!(cells.get("host").is_some());
        assert!(cells.get("missing").is_none());

        cells.by_flag_mut("p").unwrap().set("1").unwrap();
        assert_eq!(cells.get("port").unwrap().value(), &Value::Uint(1));
    }
}

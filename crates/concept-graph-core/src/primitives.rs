//! Atomic vocabulary: IRIs, object/data properties and literal values.
//!
//! These are opaque, equality-comparable handles supplied by the oracle.
//! Nothing in here knows about hierarchies.

use std::fmt;
use std::sync::Arc;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Identifier of a named entity (class, property, individual).
///
/// Backed by an `Arc<str>` so that cloning labels across thousands of
/// candidate graphs stays cheap.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Iri(Arc<str>);

impl Iri {
    /// Create a new IRI.
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(Arc::from(value.as_ref()))
    }

    /// Borrow the full IRI string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Local name: the fragment after the last `#` or `/`.
    pub fn local_name(&self) -> &str {
        self.0
            .rsplit(|c: char| c == '#' || c == '/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(self.as_str())
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.local_name())
    }
}

impl From<&str> for Iri {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Iri {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

/// An object property, optionally used in its inverse direction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PropertyExpr {
    /// The named property.
    pub iri: Iri,
    /// Whether the property is traversed backwards (`R⁻`).
    #[serde(default)]
    pub inverse: bool,
}

impl PropertyExpr {
    /// A property in its forward direction.
    pub fn named(iri: impl Into<Iri>) -> Self {
        Self {
            iri: iri.into(),
            inverse: false,
        }
    }

    /// The inverse of this property expression (`R` ↔ `R⁻`).
    pub fn inverse(&self) -> Self {
        Self {
            iri: self.iri.clone(),
            inverse: !self.inverse,
        }
    }

    /// The same property in its forward direction.
    pub fn forward(&self) -> Self {
        Self::named(self.iri.clone())
    }
}

impl fmt::Display for PropertyExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inverse {
            write!(f, "{}⁻", self.iri)
        } else {
            write!(f, "{}", self.iri)
        }
    }
}

impl From<&str> for PropertyExpr {
    fn from(s: &str) -> Self {
        Self::named(s)
    }
}

/// A datatype property relating individuals to literal values.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataProperty(pub Iri);

impl DataProperty {
    /// Create a new data property.
    pub fn new(iri: impl Into<Iri>) -> Self {
        Self(iri.into())
    }

    /// The property's IRI.
    pub fn iri(&self) -> &Iri {
        &self.0
    }
}

impl fmt::Display for DataProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DataProperty {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Numeric value with a total order so it can live in sets and maps.
pub type Numeric = OrderedFloat<f64>;

/// An observed literal value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    /// A numeric value usable as a comparison threshold.
    Numeric(Numeric),
    /// Any other lexical value.
    Text(String),
}

impl Literal {
    /// Create a numeric literal.
    pub fn number(value: f64) -> Self {
        Literal::Numeric(OrderedFloat(value))
    }

    /// The numeric value, if this literal is numeric.
    pub fn as_numeric(&self) -> Option<Numeric> {
        match self {
            Literal::Numeric(n) => Some(*n),
            Literal::Text(_) => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Numeric(n) => write!(f, "{}", n),
            Literal::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

//! Serde adapters for `f64` values that may be non-finite.
//!
//! JSON has no encoding for `inf`/`NaN` (serde_json writes `null` and refuses to
//! read it back into `f64`). Log-posteriors of `-inf` and R-hat of `+inf` are
//! ordinary values here, so these adapters write finite values as numbers and
//! non-finite ones as the strings `"inf"`, `"-inf"`, `"nan"`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum Repr {
    Num(f64),
    Text(String),
}

fn to_repr(v: f64) -> Repr {
    if v.is_finite() {
        Repr::Num(v)
    } else if v.is_nan() {
        Repr::Text("nan".to_string())
    } else if v > 0.0 {
        Repr::Text("inf".to_string())
    } else {
        Repr::Text("-inf".to_string())
    }
}

fn from_repr<E: serde::de::Error>(r: Repr) -> Result<f64, E> {
    match r {
        Repr::Num(v) => Ok(v),
        Repr::Text(s) => match s.as_str() {
            "inf" | "+inf" => Ok(f64::INFINITY),
            "-inf" => Ok(f64::NEG_INFINITY),
            "nan" => Ok(f64::NAN),
            other => Err(E::custom(format!("invalid float literal '{other}'"))),
        },
    }
}

/// `#[serde(with = "float_serde::scalar")]`
pub mod scalar {
    use super::*;

    pub fn serialize<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
        to_repr(*v).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        from_repr(Repr::deserialize(d)?)
    }
}

/// `#[serde(with = "float_serde::vec")]`
pub mod vec {
    use super::*;

    pub fn serialize<S: Serializer>(v: &[f64], s: S) -> Result<S::Ok, S::Error> {
        let reprs: Vec<Repr> = v.iter().map(|x| to_repr(*x)).collect();
        reprs.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<f64>, D::Error> {
        Vec::<Repr>::deserialize(d)?
            .into_iter()
            .map(from_repr)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Readings {
        #[serde(with = "super::scalar")]
        x: f64,
        #[serde(with = "super::vec")]
        xs: Vec<f64>,
    }

    #[test]
    fn non_finite_values_survive_json() {
        let p = Readings {
            x: f64::INFINITY,
            xs: vec![1.5, f64::NEG_INFINITY, f64::NAN],
        };
        let text = serde_json::to_string(&p).unwrap();
        assert!(text.contains("\"-inf\""));

        let back: Readings = serde_json::from_str(&text).unwrap();
        assert_eq!(back.x, f64::INFINITY);
        assert_eq!(back.xs[0], 1.5);
        assert_eq!(back.xs[1], f64::NEG_INFINITY);
        assert!(back.xs[2].is_nan());
    }
}

use thiserror::Error;

/// What a flyer senses each tick: its height, and its vertical distance to
/// the upper and lower bounds of the gap it is steering for.
pub type Inputs = [f32; 3];

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{0}")]
pub struct OracleError(pub String);

/// Anything that can steer a flyer: a network, a script, a test double.
///
/// Called once per live flyer per tick. The returned vector must hold exactly
/// one finite value; anything else aborts the evaluation.
pub trait DecisionOracle {
    fn decide(&mut self, inputs: &Inputs) -> Result<Vec<f32>, OracleError>;
}

/// Closure-backed oracle.
pub struct FnOracle<F>(pub F);

impl<F> DecisionOracle for FnOracle<F>
where
    F: FnMut(&Inputs) -> f32,
{
    fn decide(&mut self, inputs: &Inputs) -> Result<Vec<f32>, OracleError> {
        Ok(vec![(self.0)(inputs)])
    }
}

/// Box a closure as an oracle.
pub fn from_fn<F>(f: F) -> Box<dyn DecisionOracle>
where
    F: FnMut(&Inputs) -> f32 + 'static,
{
    Box::new(FnOracle(f))
}

/// Oracle that always answers `value`.
pub fn constant(value: f32) -> Box<dyn DecisionOracle> {
    from_fn(move |_| value)
}

/// Read a jump request out of an oracle output.
pub(crate) fn wants_jump(output: &[f32], threshold: f32) -> Result<bool, String> {
    match output {
        [v] if v.is_finite() => Ok(*v > threshold),
        [v] => Err(format!("non-finite output {v}")),
        _ => Err(format!("expected 1 output, got {}", output.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_strict() {
        assert_eq!(wants_jump(&[0.5], 0.5), Ok(false));
        assert_eq!(wants_jump(&[0.51], 0.5), Ok(true));
        assert_eq!(wants_jump(&[-3.0], 0.5), Ok(false));
    }

    #[test]
    fn malformed_outputs_are_errors() {
        assert!(wants_jump(&[], 0.5).is_err());
        assert!(wants_jump(&[1.0, 0.0], 0.5).is_err());
        assert!(wants_jump(&[f32::NAN], 0.5).is_err());
        assert!(wants_jump(&[f32::INFINITY], 0.5).is_err());
    }

    #[test]
    fn closures_see_the_inputs() {
        let mut oracle = FnOracle(|inputs: &Inputs| inputs[0] + inputs[1] - inputs[2]);
        assert_eq!(oracle.decide(&[1.0, 2.0, 0.5]).unwrap(), vec![2.5]);
    }
}

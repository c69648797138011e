//! Activation functions.
//!
//! Every dense layer computes a pre-activation value `s = W a + b` and then applies
//! the network-wide activation element-wise: `a' = activation(s)`.
//!
//! Only the *post-activation* outputs are cached during the forward pass. Backprop
//! recovers the derivative from those outputs (`1 - a^2` for tanh, `a > 0` for
//! ReLU), so no pre-activation buffer is needed.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
/// Element-wise activation function shared by every layer, output included.
pub enum Activation {
    #[default]
    Tanh,
    #[cfg_attr(feature = "serde", serde(rename = "relu"))]
    ReLU,
}

impl Activation {
    /// Resolve the activation into a pair of plain functions.
    ///
    /// The engine does this once per reset so the per-neuron hot path never
    /// branches on the activation kind.
    #[inline]
    pub fn resolve(self) -> ActivationFn {
        match self {
            Activation::Tanh => ActivationFn {
                kind: self,
                forward: tanh,
                grad_from_output: tanh_grad_from_output,
            },
            Activation::ReLU => ActivationFn {
                kind: self,
                forward: relu,
                grad_from_output: relu_grad_from_output,
            },
        }
    }

    /// Returns true if `y` lies in the activation's output range.
    pub fn contains(self, y: f32) -> bool {
        match self {
            Activation::Tanh => (-1.0..=1.0).contains(&y),
            Activation::ReLU => y >= 0.0,
        }
    }

    /// Lowercase name, as accepted by [`Activation::from_name`].
    pub fn name(self) -> &'static str {
        match self {
            Activation::Tanh => "tanh",
            Activation::ReLU => "relu",
        }
    }

    /// Parse `"tanh"` or `"relu"`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "tanh" => Some(Activation::Tanh),
            "relu" => Some(Activation::ReLU),
            _ => None,
        }
    }
}

/// A resolved activation strategy.
#[derive(Clone, Copy)]
pub struct ActivationFn {
    kind: Activation,
    forward: fn(f32) -> f32,
    grad_from_output: fn(f32) -> f32,
}

impl ActivationFn {
    #[inline]
    pub fn kind(&self) -> Activation {
        self.kind
    }

    #[inline]
    pub fn forward(&self, x: f32) -> f32 {
        (self.forward)(x)
    }

    /// Derivative of the activation with respect to its input, expressed in terms
    /// of the cached post-activation output `y`.
    #[inline]
    pub fn grad_from_output(&self, y: f32) -> f32 {
        (self.grad_from_output)(y)
    }
}

impl std::fmt::Debug for ActivationFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ActivationFn").field(&self.kind).finish()
    }
}

#[inline]
fn tanh(x: f32) -> f32 {
    x.tanh()
}

#[inline]
fn tanh_grad_from_output(y: f32) -> f32 {
    1.0 - y * y
}

#[inline]
fn relu(x: f32) -> f32 {
    x.max(0.0)
}

#[inline]
fn relu_grad_from_output(y: f32) -> f32 {
    if y > 0.0 { 1.0 } else { 0.0 }
}

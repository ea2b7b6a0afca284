mod sigmoid;
mod softmax;
mod tanh;

pub use sigmoid::Sigmoid;
pub use softmax::softmax;
pub use tanh::Tanh;

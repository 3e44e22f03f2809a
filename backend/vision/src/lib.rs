pub mod invoker;
pub mod providers;

pub use invoker::{DegradeReason, InvokerSettings, LayerOutcome, VisionInvoker, SYSTEM_PROMPT};
pub use providers::mock::{MockProvider, MockReply};
pub use providers::{build_provider, ProviderRegistry};

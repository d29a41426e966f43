pub use crate::asset::{Asset, AssetState, Loadable};
pub use crate::context::{EngineContext, Liveness, ResourceTables, Settings};
pub use crate::errors::Result;
pub use crate::shared::SharedHandle;
pub use crate::table::HandleTable;
pub use crate::utils::handle::{Handle, HandleIndex, HandleLike};

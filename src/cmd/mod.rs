mod create;
mod meta;
mod validate;

use crate::prelude::*;
use async_trait::async_trait;

pub use create::*;
pub use meta::*;
pub use validate::*;

#[async_trait]
pub(crate) trait Cmd {
    async fn run(self) -> Result;
}

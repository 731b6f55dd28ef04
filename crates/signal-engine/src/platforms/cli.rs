//! Console output, the fallback when no chat notifier is configured

use super::Notifier;
use crate::error::Result;
use async_trait::async_trait;

pub const CONSOLE_CHANNEL: &str = "console";

pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn name(&self) -> &'static str {
        CONSOLE_CHANNEL
    }

    async fn deliver(&self, _destination: &str, text: &str) -> Result<()> {
        println!("{text}");
        Ok(())
    }
}

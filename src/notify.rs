use crate::error::Result;
use std::path::Path;

/// Optional collaborator for sending a finished reconciliation sheet to an
/// operator. The pipeline only calls it when one is configured; no
/// transport implementation ships with this crate.
pub trait Notifier {
    fn send_with_attachment(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        attachment: &Path,
    ) -> Result<()>;
}

mod error;
mod format;
mod sinks;

pub use format::format_line;
pub use sinks::Sink;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Sends `line` to every sink in order. A failing sink is logged and skipped.
pub async fn dispatch(line: &str, sinks: &[Sink]) -> DispatchReport {
    let mut report = DispatchReport::default();
    if line.is_empty() {
        return report;
    }

    for sink in sinks {
        match sink.deliver(line).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                log::error!("sink failure for {}: {}", sink, e);
                report.failed += 1;
            }
        }
    }
    report
}

use std::collections::VecDeque;
use std::io::BufRead;
use std::io::Write;

use anyhow::Context;
use anyhow::Result;
use anyhow::ensure;
use candy_contracts::DispatchRequest;
use candy_dispatch_engine::ErrorKind;
use flume::Receiver;
use serde_json::Value;
use serde_json::json;
use tracing::Level;
use tracing::event;

use crate::DispatchFailure;
use crate::worker_pool::DispatchResult;
use crate::worker_pool::WorkerPool;

enum PendingReply {
    Submitted(Receiver<DispatchResult>),
    Unreadable(DispatchFailure),
}

/// Reads one JSON `DispatchRequest` per line and writes one JSON reply per
/// line, in request order. Up to `read_ahead` requests are in the pool at
/// once, so requests inside that window run concurrently.
pub fn serve_lines<R: BufRead, W: Write>(
    worker_pool: &WorkerPool,
    reader: R,
    mut writer: W,
    read_ahead: usize,
) -> Result<()> {
    ensure!(read_ahead > 0, "read_ahead has to be at least 1");

    let mut pending = VecDeque::with_capacity(read_ahead);

    for line in reader.lines() {
        let line = line.context("could not read request line")?;
        if line.trim().is_empty() {
            continue;
        }

        let pending_reply = match serde_json::from_str::<DispatchRequest>(&line) {
            Ok(request) => PendingReply::Submitted(worker_pool.submit(request)?),
            Err(error) => {
                event!(Level::WARN, %error, "unreadable request");
                PendingReply::Unreadable(DispatchFailure {
                    kind: ErrorKind::BusinessRule,
                    message: error.to_string(),
                    details: None,
                })
            }
        };
        pending.push_back(pending_reply);

        if pending.len() >= read_ahead {
            write_oldest(&mut pending, &mut writer)?;
        }
    }

    while !pending.is_empty() {
        write_oldest(&mut pending, &mut writer)?;
    }
    Ok(())
}

fn write_oldest<W: Write>(pending: &mut VecDeque<PendingReply>, writer: &mut W) -> Result<()> {
    let Some(pending_reply) = pending.pop_front() else {
        return Ok(());
    };

    let reply = match pending_reply {
        PendingReply::Submitted(response) => {
            match response
                .recv()
                .context("worker pool stopped before answering")?
            {
                Ok(response) => serde_json::to_value(response)?,
                Err(failure) => failure_reply(failure),
            }
        }
        PendingReply::Unreadable(failure) => failure_reply(failure),
    };

    writeln!(writer, "{reply}").context("could not write reply")?;
    writer.flush().context("could not flush reply")?;
    Ok(())
}

fn failure_reply(failure: DispatchFailure) -> Value {
    json!({ "failure": failure })
}

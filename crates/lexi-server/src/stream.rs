//! Shaping of the relayed token stream: word pacing and the request deadline.

use std::collections::VecDeque;
use std::time::Duration;

use futures::StreamExt;
use tokio::time::{sleep, timeout_at, Instant};

use lexi_core::ports::TextStream;
use lexi_core::smooth::WordChunker;
use lexi_types::config::SmoothingConfig;
use lexi_types::{ChatError, Result};

struct SmoothState {
    inner: TextStream,
    chunker: WordChunker,
    ready: VecDeque<Result<String>>,
    finished: bool,
    delay: Duration,
    /// A chunk has gone out, so the next one waits for `delay`
    paced: bool,
}

/// Re-cut upstream deltas into whole words, releasing one word per `delay`.
/// Text still buffered when upstream ends (or fails) is flushed first.
pub fn smooth(inner: TextStream, config: &SmoothingConfig) -> TextStream {
    if !config.enabled {
        return inner;
    }

    let state = SmoothState {
        inner,
        chunker: WordChunker::new(),
        ready: VecDeque::new(),
        finished: false,
        delay: Duration::from_millis(config.delay_ms),
        paced: false,
    };

    futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.ready.pop_front() {
                if item.is_ok() {
                    if st.paced && !st.delay.is_zero() {
                        sleep(st.delay).await;
                    }
                    st.paced = true;
                }
                return Some((item, st));
            }
            if st.finished {
                return None;
            }
            match st.inner.next().await {
                Some(Ok(fragment)) => {
                    st.ready.extend(st.chunker.push(&fragment).into_iter().map(Ok));
                }
                Some(Err(e)) => {
                    st.ready.extend(st.chunker.flush().map(Ok));
                    st.ready.push_back(Err(e));
                    st.finished = true;
                }
                None => {
                    st.ready.extend(st.chunker.flush().map(Ok));
                    st.finished = true;
                }
            }
        }
    })
    .boxed()
}

/// End the stream with [`ChatError::Timeout`] once `deadline` passes.
pub fn with_deadline(inner: TextStream, deadline: Instant, limit_ms: u64) -> TextStream {
    futures::stream::unfold(Some(inner), move |state| async move {
        let mut inner = state?;
        match timeout_at(deadline, inner.next()).await {
            Ok(Some(item)) => Some((item, Some(inner))),
            Ok(None) => None,
            Err(_) => Some((Err(ChatError::Timeout(limit_ms)), None)),
        }
    })
    .boxed()
}

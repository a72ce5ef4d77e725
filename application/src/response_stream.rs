use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Fragment(String),
    /// End of stream; everything was delivered.
    Done,
    /// The producer failed; fragments already delivered remain valid.
    Failed(String),
}

/// Consumer half of the synthesis channel. Pull-based: the producer waits when
/// the bounded buffer is full.
pub struct ResponseStream {
    rx: mpsc::Receiver<StreamEvent>,
    accumulated: String,
    finished: bool,
}

impl ResponseStream {
    pub fn channel(capacity: usize) -> (mpsc::Sender<StreamEvent>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            tx,
            Self {
                rx,
                accumulated: String::new(),
                finished: false,
            },
        )
    }

    /// Next event, or `None` once a terminal event has been returned.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        if self.finished {
            return None;
        }
        let event = self.rx.recv().await.unwrap_or_else(|| {
            StreamEvent::Failed("response stream closed without completing".to_string())
        });
        match &event {
            StreamEvent::Fragment(fragment) => self.accumulated.push_str(fragment),
            StreamEvent::Done | StreamEvent::Failed(_) => self.finished = true,
        }
        Some(event)
    }

    /// Concatenation of every fragment received so far.
    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }
}

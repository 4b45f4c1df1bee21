use glam::Vec2;
use strum_macros::Display;
use workflow::block::BlockId;
use workflow::connection::ConnectionId;
use workflow::error::Rejection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Notice {
        Notice {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Notice {
        Notice {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Notice {
        Notice {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl From<&Rejection> for Notice {
    fn from(rejection: &Rejection) -> Notice {
        Notice::warning(rejection.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockMove {
    pub before: Vec2,
    pub after: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    BlockAdded {
        block_id: BlockId,
    },
    BlockUpdated {
        block_id: BlockId,
    },
    BlockRemoved {
        block_id: BlockId,
    },
    /// One or more blocks moved together, as by a group drag.
    BlockMoved {
        block_ids: Vec<BlockId>,
        moves: Vec<BlockMove>,
    },
    ConnectionAdded {
        connection_id: ConnectionId,
    },
    ConnectionRemoved {
        connection_id: ConnectionId,
    },
    SelectionChanged {
        selected: Vec<BlockId>,
    },
    ViewChanged {
        before_pan: Vec2,
        before_zoom: u16,
        after_pan: Vec2,
        after_zoom: u16,
    },
}

impl EditorAction {
    /// Discrete actions are recorded as they happen; continuous ones are
    /// merged with the previous action of the same kind.
    pub fn immediate(&self) -> bool {
        match self {
            EditorAction::BlockAdded { .. }
            | EditorAction::BlockUpdated { .. }
            | EditorAction::BlockRemoved { .. }
            | EditorAction::ConnectionAdded { .. }
            | EditorAction::ConnectionRemoved { .. }
            | EditorAction::SelectionChanged { .. } => true,
            EditorAction::BlockMoved { .. } | EditorAction::ViewChanged { .. } => false,
        }
    }
}

/// What the host should show or observe since it last drained the queue.
#[derive(Debug, Default)]
pub struct EditorFeedback {
    actions: Vec<EditorAction>,
    notices: Vec<Notice>,
    pending_action: Option<EditorAction>,
}

impl EditorFeedback {
    pub fn actions(&self) -> &[EditorAction] {
        &self.actions
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.notices.is_empty() && self.pending_action.is_none()
    }

    pub fn add_action(&mut self, action: EditorAction) {
        if action.immediate() {
            self.flush();
            self.actions.push(action);
        } else {
            self.add_pending_action(action);
        }
    }

    pub fn add_notice(&mut self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => tracing::error!("{}", notice.message),
            NoticeLevel::Warning => tracing::warn!("{}", notice.message),
            NoticeLevel::Info => tracing::info!("{}", notice.message),
        }
        self.notices.push(notice);
    }

    pub fn reject(&mut self, rejection: &Rejection) {
        self.add_notice(Notice::from(rejection));
    }

    fn add_pending_action(&mut self, action: EditorAction) {
        assert!(!action.immediate());

        let Some(pending) = self.pending_action.take() else {
            self.pending_action = Some(action);
            return;
        };

        match (pending, action) {
            (
                EditorAction::BlockMoved {
                    block_ids: ids1,
                    moves: before_moves,
                },
                EditorAction::BlockMoved {
                    block_ids: ids2,
                    moves: after_moves,
                },
            ) if ids1 == ids2 => {
                let moves = before_moves
                    .iter()
                    .zip(after_moves.iter())
                    .map(|(first, last)| BlockMove {
                        before: first.before,
                        after: last.after,
                    })
                    .collect();
                self.pending_action = Some(EditorAction::BlockMoved {
                    block_ids: ids1,
                    moves,
                });
            }
            (
                EditorAction::ViewChanged {
                    before_pan,
                    before_zoom,
                    ..
                },
                EditorAction::ViewChanged {
                    after_pan,
                    after_zoom,
                    ..
                },
            ) => {
                self.pending_action = Some(EditorAction::ViewChanged {
                    before_pan,
                    before_zoom,
                    after_pan,
                    after_zoom,
                });
            }
            (pending, action) => {
                self.actions.push(pending);
                self.pending_action = Some(action);
            }
        }
    }

    /// Closes the current run of continuous actions.
    pub fn flush(&mut self) {
        if let Some(pending) = self.pending_action.take() {
            self.actions.push(pending);
        }
    }

    /// Drains everything collected so far.
    pub fn take(&mut self) -> EditorFeedback {
        self.flush();
        std::mem::take(self)
    }
}

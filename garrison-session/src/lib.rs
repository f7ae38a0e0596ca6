//! GARRISON Session - One authoritative game per tokio task
//!
//! This crate owns a running game:
//! - All mutations arrive as commands and are applied one at a time
//! - Players read through a `SideView`, which only ever hands out snapshots
//!   redacted for its own side
//! - AI sides think on the blocking pool; their move comes back as a result
//!   and goes through the same serial path as any other move
//! - Applied moves are broadcast as public `MoveReport`s for remote peers

use garrison_core::{
    BoardSnapshot, Game, GameError, Move, MoveReport, Outcome, Placement, Position, Side, Strategy,
    Viewer,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

const COMMAND_BUFFER: usize = 32;
const REPORT_BUFFER: usize = 256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Game(#[from] GameError),

    #[error("{0} is played by the computer")]
    AiControlled(Side),

    #[error("move limit of {0} reached")]
    MoveLimit(usize),

    #[error("the session has shut down")]
    Closed,
}

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

enum Command {
    Deploy {
        side: Side,
        placements: Vec<Placement>,
        reply: Reply<()>,
    },
    Start {
        reply: Reply<()>,
    },
    Move {
        side: Side,
        mv: Move,
        reply: Reply<MoveReport>,
    },
    Surrender {
        side: Side,
        reply: Reply<Outcome>,
    },
    LimitMoves {
        limit: usize,
        reply: Reply<()>,
    },
}

/// Result of one AI turn; `strategy` is `None` if the worker panicked
struct Thought {
    side: Side,
    strategy: Option<Box<dyn Strategy>>,
    mv: Option<Move>,
}

// ============================================================================
// HANDLE
// ============================================================================

/// Cloneable access to a running session
#[derive(Clone)]
pub struct GameHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<Arc<Game>>,
    reports: broadcast::Sender<MoveReport>,
}

impl GameHandle {
    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    pub async fn deploy(&self, side: Side, placements: Vec<Placement>) -> Result<(), SessionError> {
        self.request(|reply| Command::Deploy {
            side,
            placements,
            reply,
        })
        .await
    }

    pub async fn start(&self) -> Result<(), SessionError> {
        self.request(|reply| Command::Start { reply }).await
    }

    pub async fn submit_move(&self, side: Side, mv: Move) -> Result<MoveReport, SessionError> {
        self.request(|reply| Command::Move { side, mv, reply }).await
    }

    pub async fn surrender(&self, side: Side) -> Result<Outcome, SessionError> {
        self.request(|reply| Command::Surrender { side, reply }).await
    }

    /// Stop applying moves once the history holds `limit` of them. AI sides
    /// stop thinking and external moves get `MoveLimit`.
    pub async fn limit_moves(&self, limit: usize) -> Result<(), SessionError> {
        self.request(|reply| Command::LimitMoves { limit, reply }).await
    }

    /// Latest committed ground truth, hidden ranks included.
    ///
    /// For the engine side of the table (AI hosts, record keeping, referee
    /// displays). Anything shown to a player goes through `for_side`.
    pub fn current(&self) -> Arc<Game> {
        self.state.borrow().clone()
    }

    /// Read and act as one side only
    pub fn for_side(&self, side: Side) -> SideView {
        SideView {
            side,
            handle: self.clone(),
            state: self.state.clone(),
        }
    }

    /// Public reports of moves applied from now on
    pub fn reports(&self) -> broadcast::Receiver<MoveReport> {
        self.reports.subscribe()
    }

    /// Wait until a committed state satisfies `pred`
    pub async fn wait_until(&self, pred: impl FnMut(&Arc<Game>) -> bool) -> Result<Arc<Game>, SessionError> {
        let mut rx = self.state.clone();
        let game = rx.wait_for(pred).await.map_err(|_| SessionError::Closed)?;
        Ok(game.clone())
    }

    pub async fn wait_for_game_over(&self) -> Result<Outcome, SessionError> {
        let game = self.wait_until(|g| g.is_game_over()).await?;
        game.outcome().ok_or(SessionError::Closed)
    }
}

// ============================================================================
// SIDE VIEW
// ============================================================================

/// One player's window on a session: every read is redacted for `side`
pub struct SideView {
    side: Side,
    handle: GameHandle,
    state: watch::Receiver<Arc<Game>>,
}

impl SideView {
    pub fn side(&self) -> Side {
        self.side
    }

    /// Board as this side may see it
    pub fn snapshot(&self) -> BoardSnapshot {
        self.state.borrow().snapshot(Viewer::Side(self.side))
    }

    /// Destinations of this side's own unit on `pos`
    pub fn legal_destinations(&self, pos: Position) -> Vec<Position> {
        self.state.borrow().legal_destinations(self.side, pos)
    }

    pub fn is_my_turn(&self) -> bool {
        self.state.borrow().to_move() == Some(self.side)
    }

    /// Wait for the next committed change and return the new view
    pub async fn changed(&mut self) -> Result<BoardSnapshot, SessionError> {
        self.state.changed().await.map_err(|_| SessionError::Closed)?;
        Ok(self.snapshot())
    }

    pub async fn deploy(&self, placements: Vec<Placement>) -> Result<(), SessionError> {
        self.handle.deploy(self.side, placements).await
    }

    pub async fn submit_move(&self, mv: Move) -> Result<MoveReport, SessionError> {
        self.handle.submit_move(self.side, mv).await
    }

    pub async fn surrender(&self) -> Result<Outcome, SessionError> {
        self.handle.surrender(self.side).await
    }
}

// ============================================================================
// SESSION TASK
// ============================================================================

/// Spawn the task that owns `game`; each listed side is played by its
/// strategy. The task ends when every handle is dropped.
pub fn spawn_game(game: Game, strategies: Vec<(Side, Box<dyn Strategy>)>) -> GameHandle {
    let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
    let (state_tx, state) = watch::channel(Arc::new(game.clone()));
    let (reports, _) = broadcast::channel(REPORT_BUFFER);

    let mut slots: [Option<Box<dyn Strategy>>; 2] = [None, None];
    for (side, strategy) in strategies {
        tracing::info!("{} plays {}", strategy.name(), side);
        slots[side as usize] = Some(strategy);
    }

    let session = Session {
        game,
        ai_sides: [slots[0].is_some(), slots[1].is_some()],
        strategies: slots,
        thinking: None,
        move_limit: None,
        state_tx,
        reports: reports.clone(),
    };
    tokio::spawn(session.run(rx));

    GameHandle {
        commands,
        state,
        reports,
    }
}

struct Session {
    game: Game,
    strategies: [Option<Box<dyn Strategy>>; 2],
    ai_sides: [bool; 2],
    /// Side whose strategy is currently on the blocking pool
    thinking: Option<Side>,
    move_limit: Option<usize>,
    state_tx: watch::Sender<Arc<Game>>,
    reports: broadcast::Sender<MoveReport>,
}

impl Session {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        let (thought_tx, mut thoughts) = mpsc::channel::<Thought>(1);

        loop {
            self.think(&thought_tx);

            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                Some(thought) = thoughts.recv() => self.conclude(thought),
            }
        }

        tracing::debug!("session closed");
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Deploy {
                side,
                placements,
                reply,
            } => {
                let result = self.game.submit_deployment(side, &placements);
                self.publish();
                let _ = reply.send(result.map_err(Into::into));
            }
            Command::Start { reply } => {
                let result = self.game.start();
                self.publish();
                let _ = reply.send(result.map_err(Into::into));
            }
            Command::Move { side, mv, reply } => {
                let _ = reply.send(self.external_move(side, mv));
            }
            Command::Surrender { side, reply } => {
                let result = self.game.surrender(side);
                self.publish();
                let _ = reply.send(result.map_err(Into::into));
            }
            Command::LimitMoves { limit, reply } => {
                tracing::debug!("move limit set to {}", limit);
                self.move_limit = Some(limit);
                let _ = reply.send(Ok(()));
            }
        }
    }

    fn limit_reached(&self) -> bool {
        self.move_limit
            .is_some_and(|limit| self.game.history().len() >= limit)
    }

    fn external_move(&mut self, side: Side, mv: Move) -> Result<MoveReport, SessionError> {
        if let Some(busy) = self.thinking {
            return Err(GameError::NotYourTurn {
                expected: busy,
                got: side,
            }
            .into());
        }
        if self.ai_sides[side as usize] {
            return Err(SessionError::AiControlled(side));
        }
        if let Some(limit) = self.move_limit.filter(|_| self.limit_reached()) {
            return Err(SessionError::MoveLimit(limit));
        }
        Ok(self.apply(side, mv)?)
    }

    fn apply(&mut self, side: Side, mv: Move) -> Result<MoveReport, GameError> {
        let report = self.game.submit_move(side, mv)?;
        for strategy in self.strategies.iter_mut().flatten() {
            strategy.observe(&report);
        }
        self.publish();
        let _ = self.reports.send(report);
        Ok(report)
    }

    fn publish(&self) {
        self.state_tx.send_replace(Arc::new(self.game.clone()));
    }

    /// Hand the side to move to its strategy, if it has one and is idle
    fn think(&mut self, thoughts: &mpsc::Sender<Thought>) {
        if self.thinking.is_some() || self.limit_reached() {
            return;
        }
        let Some(side) = self.game.to_move() else {
            return;
        };
        let Some(mut strategy) = self.strategies[side as usize].take() else {
            return;
        };

        self.thinking = Some(side);
        let game = self.game.clone();
        let thoughts = thoughts.clone();
        tracing::debug!("{} ({}) is thinking", side, strategy.name());

        tokio::spawn(async move {
            let work = tokio::task::spawn_blocking(move || {
                let mv = strategy.choose_move(&game);
                (strategy, mv)
            });
            let thought = match work.await {
                Ok((strategy, mv)) => Thought {
                    side,
                    strategy: Some(strategy),
                    mv,
                },
                Err(e) => {
                    tracing::error!("{} AI worker failed: {}", side, e);
                    Thought {
                        side,
                        strategy: None,
                        mv: None,
                    }
                }
            };
            let _ = thoughts.send(thought).await;
        });
    }

    fn conclude(&mut self, thought: Thought) {
        let Thought { side, strategy, mv } = thought;
        self.thinking = None;

        let Some(strategy) = strategy else {
            // Without a strategy the side would stall forever; leave it to the caller
            self.ai_sides[side as usize] = false;
            return;
        };

        match mv {
            Some(mv) => {
                self.strategies[side as usize] = Some(strategy);
                if self.game.to_move() != Some(side) || self.limit_reached() {
                    tracing::debug!("discarding {} AI move {:?}: turn is over", side, mv);
                    return;
                }
                debug_assert!(
                    self.game.legal_moves().contains(&mv),
                    "{side} AI chose illegal move {mv:?}"
                );
                if let Err(e) = self.apply(side, mv) {
                    tracing::error!("{} AI move {:?} rejected: {}; releasing the side", side, mv, e);
                    self.strategies[side as usize] = None;
                    self.ai_sides[side as usize] = false;
                }
            }
            None if self.game.to_move() == Some(side) => {
                tracing::error!("{} AI ({}) returned no move; releasing the side", side, strategy.name());
                self.ai_sides[side as usize] = false;
            }
            None => {
                self.strategies[side as usize] = Some(strategy);
            }
        }
    }
}

//! Single-writer game session.
//!
//! One actor task owns the only mutable snapshot. Player commands arrive
//! on an `mpsc` channel and interleave with the 1 Hz tick only at whole
//! transition granularity, so a tick can never lose a concurrent action's
//! write (and vice versa). Committed snapshots are broadcast over a
//! `watch` channel; persistence writes are spawned fire-and-forget and
//! never block the loop.
//!
//! On spawn, an absence since `last_online_timestamp` is turned into a
//! pending [`OfflineReward`]; the tick loop stays held until the player
//! acknowledges it (optionally doubled). Pause/resume gates the same loop
//! and never double-starts it.

use std::sync::Arc;
use std::time::Duration;

use academy_core::{DepartmentKind, FacilityKind, GameState, PrestigeSkillKind};
use chrono::Utc;
use persistence::SaveStore;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::actions::{self, OfflineReward};

/// Buffered player commands; the queue preserves arrival order.
const COMMAND_BUFFER: usize = 64;

/// Requests accepted by the session actor.
#[derive(Debug)]
pub enum Command {
    SetSchoolName(String),
    UpgradeDepartment(DepartmentKind),
    UpgradeFacility(FacilityKind),
    RecruitStudent,
    AssignStudents(DepartmentKind, u32),
    UnassignStudents(DepartmentKind, u32),
    UpgradePrestigeSkill(PrestigeSkillKind),
    StartBoost,
    DoubleResources,
    Prestige,
    ClaimOfflineReward { doubled: bool },
    QueryOfflineReward(oneshot::Sender<Option<OfflineReward>>),
    Pause,
    Resume,
    Shutdown(oneshot::Sender<()>),
}

/// Cheap cloneable handle to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    cmd_tx: mpsc::Sender<Command>,
    state_rx: watch::Receiver<GameState>,
}

impl SessionHandle {
    /// Spawn the session actor on the current runtime. `store` is the
    /// save gateway; pass `None` to run without persistence.
    pub fn spawn(initial: GameState, store: Option<Arc<dyn SaveStore>>) -> SessionHandle {
        let now = Utc::now().timestamp();
        let pending = actions::pending_offline_reward(&initial, now);
        if let Some(reward) = &pending {
            info!(minutes = reward.minutes, "offline reward pending");
        }
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let (state_tx, state_rx) = watch::channel(initial.clone());
        let session = Session {
            state: initial,
            store,
            state_tx,
            pending_offline: pending,
            ticking: true,
        };
        tokio::spawn(session.run(cmd_rx));
        SessionHandle { cmd_tx, state_rx }
    }

    /// Latest committed snapshot.
    pub fn state(&self) -> GameState {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to committed snapshots.
    pub fn subscribe(&self) -> watch::Receiver<GameState> {
        self.state_rx.clone()
    }

    /// Enqueue a command; completes once the actor has accepted it.
    pub async fn send(&self, cmd: Command) {
        if self.cmd_tx.send(cmd).await.is_err() {
            warn!("session actor is gone; command dropped");
        }
    }

    /// The offline reward awaiting acknowledgement, if any.
    pub async fn pending_offline_reward(&self) -> Option<OfflineReward> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::QueryOfflineReward(tx)).await;
        rx.await.unwrap_or(None)
    }

    /// Stop the actor after a final durable save.
    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Shutdown(tx)).await;
        let _ = rx.await;
    }
}

struct Session {
    state: GameState,
    store: Option<Arc<dyn SaveStore>>,
    state_tx: watch::Sender<GameState>,
    pending_offline: Option<OfflineReward>,
    ticking: bool,
}

impl Session {
    async fn run(mut self, mut cmd_rx: mpsc::Receiver<Command>) {
        let mut ticker = tokio::time::interval_at(
            tokio::time::Instant::now() + Duration::from_secs(1),
            Duration::from_secs(1),
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick(), if self.live() => {
                    let now = Utc::now().timestamp();
                    self.commit("tick", Some(actions::tick(&self.state, now)));
                }
                cmd = cmd_rx.recv() => match cmd {
                    Some(Command::Shutdown(ack)) => {
                        self.final_save();
                        let _ = ack.send(());
                        break;
                    }
                    Some(cmd) => {
                        let was_live = self.live();
                        self.handle(cmd);
                        if !was_live && self.live() {
                            // Held seconds were settled in bulk (or not at
                            // all); don't replay them as a burst tick.
                            ticker.reset();
                        }
                    }
                    // All handles dropped: save and wind down.
                    None => {
                        self.final_save();
                        break;
                    }
                },
            }
        }
        info!("session actor stopped");
    }

    /// The tick loop runs only while unpaused and not waiting on an
    /// offline acknowledgement.
    fn live(&self) -> bool {
        self.ticking && self.pending_offline.is_none()
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::SetSchoolName(name) => {
                self.commit("set_school_name", actions::set_school_name(&self.state, &name));
            }
            Command::UpgradeDepartment(kind) => {
                self.commit(
                    "upgrade_department",
                    actions::upgrade_department(&self.state, kind),
                );
            }
            Command::UpgradeFacility(kind) => {
                self.commit(
                    "upgrade_facility",
                    actions::upgrade_facility(&self.state, kind),
                );
            }
            Command::RecruitStudent => {
                self.commit("recruit_student", actions::recruit_student(&self.state));
            }
            Command::AssignStudents(kind, count) => {
                self.commit(
                    "assign_students",
                    actions::assign_students(&self.state, kind, count),
                );
            }
            Command::UnassignStudents(kind, count) => {
                self.commit(
                    "unassign_students",
                    actions::unassign_students(&self.state, kind, count),
                );
            }
            Command::UpgradePrestigeSkill(kind) => {
                self.commit(
                    "upgrade_prestige_skill",
                    actions::upgrade_prestige_skill(&self.state, kind),
                );
            }
            Command::StartBoost => {
                self.commit("start_boost", actions::start_boost(&self.state));
            }
            Command::DoubleResources => {
                self.commit("double_resources", actions::double_resources(&self.state));
            }
            Command::Prestige => {
                let now = Utc::now().timestamp();
                self.commit("prestige", actions::prestige(&self.state, now));
            }
            Command::ClaimOfflineReward { doubled } => match self.pending_offline.take() {
                Some(reward) => {
                    let now = Utc::now().timestamp();
                    let next =
                        actions::claim_offline_reward(&self.state, &reward, doubled, now);
                    self.commit("claim_offline_reward", Some(next));
                }
                None => debug!("no offline reward to claim"),
            },
            Command::QueryOfflineReward(reply) => {
                let _ = reply.send(self.pending_offline.clone());
            }
            Command::Pause => {
                self.ticking = false;
            }
            Command::Resume => {
                if !self.ticking {
                    // A fresh absence may have accrued while paused.
                    let now = Utc::now().timestamp();
                    self.pending_offline = actions::pending_offline_reward(&self.state, now);
                    self.ticking = true;
                }
            }
            Command::Shutdown(_) => unreachable!("handled in the select loop"),
        }
    }

    /// Install a committed snapshot, publish it, and kick off a
    /// best-effort save. A `None` transition is a guard rejection and
    /// leaves everything as it was.
    fn commit(&mut self, op: &'static str, next: Option<GameState>) {
        match next {
            Some(next) => {
                self.state = next;
                let _ = self.state_tx.send(self.state.clone());
                self.spawn_save();
            }
            None => debug!(op, "guard rejected operation"),
        }
    }

    /// Fire-and-forget persistence: last write wins, failures are logged
    /// and swallowed, and the loop never waits on the write.
    fn spawn_save(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let store = Arc::clone(store);
        let state = self.state.clone();
        tokio::spawn(async move {
            let result =
                tokio::task::spawn_blocking(move || persistence::save_state(store.as_ref(), &state))
                    .await;
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "background save failed"),
                Err(e) => warn!(error = %e, "background save task died"),
            }
        });
    }

    /// Synchronous save at teardown; the one write worth waiting for.
    fn final_save(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = persistence::save_state(store.as_ref(), &self.state) {
                warn!(error = %e, "final save failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persistence::MemoryStore;
    use rust_decimal::Decimal;

    fn seeded_state(students: u32) -> GameState {
        let mut s = GameState::fresh(Utc::now().timestamp());
        s.students.total_students = students;
        s.facilities.research_wing = 1;
        s.mana = Decimal::from(100u32);
        s
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_accrue_production() {
        let handle = SessionHandle::spawn(seeded_state(3), None);
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        let state = handle.state();
        // Three whole ticks at 3 mana/s on top of the seed.
        assert_eq!(state.mana, Decimal::from(109u32));
        assert_eq!(state.gold, Decimal::new(450, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn actions_and_ticks_serialize_without_lost_updates() {
        let handle = SessionHandle::spawn(seeded_state(3), None);
        tokio::time::sleep(Duration::from_millis(1_100)).await;
        // 103 mana after one tick; the upgrade spends 10.
        handle
            .send(Command::UpgradeDepartment(DepartmentKind::Botany))
            .await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        let state = handle.state();
        assert_eq!(state.departments.botany, 1);
        assert_eq!(state.mana, Decimal::from(93u32));
        // The next tick sees the upgraded botany rate: 3 x 1.1 = 3.3.
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(handle.state().mana, Decimal::new(963, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn guard_rejection_changes_nothing() {
        let mut initial = seeded_state(0);
        initial.mana = Decimal::from(5u32);
        let before = initial.clone();
        let handle = SessionHandle::spawn(initial, None);
        handle
            .send(Command::UpgradeDepartment(DepartmentKind::Botany))
            .await;
        handle.send(Command::RecruitStudent).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(handle.state(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_resume_never_double_starts_the_loop() {
        let handle = SessionHandle::spawn(seeded_state(1), None);
        handle.send(Command::Pause).await;
        handle.send(Command::Resume).await;
        handle.send(Command::Resume).await;
        tokio::time::sleep(Duration::from_millis(2_100)).await;
        // Two seconds, two ticks; a doubled loop would show 4 mana.
        assert_eq!(handle.state().mana, Decimal::from(102u32));
    }

    #[tokio::test(start_paused = true)]
    async fn offline_reward_holds_ticks_until_claimed() {
        let mut away = seeded_state(3);
        away.last_online_timestamp = Utc::now().timestamp() - 7_200;
        let handle = SessionHandle::spawn(away, None);
        let reward = handle.pending_offline_reward().await.expect("reward");
        assert_eq!(reward.minutes, 60);
        // Held: no production while unacknowledged.
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(handle.state().mana, Decimal::from(100u32));
        handle
            .send(Command::ClaimOfflineReward { doubled: true })
            .await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        let state = handle.state();
        assert_eq!(state.mana, Decimal::from(100 + 2 * 3 * 3_600u32));
        assert!(handle.pending_offline_reward().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn prestige_resets_through_the_actor() {
        let mut s = seeded_state(0);
        s.school_name = "Nightspire".to_string();
        s.departments.attack_magic = 5;
        s.total_magical_power = Decimal::from(1_000_000u32);
        let handle = SessionHandle::spawn(s, None);
        handle.send(Command::Prestige).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        let state = handle.state();
        assert_eq!(state.school_name, "Nightspire");
        assert_eq!(state.philosophers_stones, 6);
        assert_eq!(state.departments.attack_magic, 0);
        assert_eq!(state.mana, Decimal::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_persists_the_final_snapshot() {
        let store = Arc::new(MemoryStore::new());
        let handle =
            SessionHandle::spawn(seeded_state(0), Some(store.clone() as Arc<dyn SaveStore>));
        handle
            .send(Command::SetSchoolName("Nightspire".to_string()))
            .await;
        handle.shutdown().await;
        let saved = persistence::load_state_or_default(store.as_ref(), 0);
        assert_eq!(saved.school_name, "Nightspire");
    }
}

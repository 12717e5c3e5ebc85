use crate::error::{EdgeError, InvalidSlotSnafu, MissingSlotSnafu, SaveStateIoSnafu};
use crate::state::save_state::SaveState;
use crate::state::{
    MAIN_SLOT, MAX_SLOTS, MEMORY_SAVES_COUNT, REWIND_FRAMES, SAVE_INTERVAL_FRAMES, SCREENSHOT_FILE_NAME,
    STATE_FILE_NAME,
};
use crate::video::screen::Screen;
use log::{info, warn};
use snafu::{ensure, ResultExt};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Numbered save slots of one game plus an in-memory rewind buffer.
///
/// Slot `n` lives in `<game-dir>/<n>/` as `state.bin` with a screenshot beside it.
/// Slot 0 is the main slot, 1 to 9 are used round robin by the rotating saves.
pub struct StateController {
    game_dir: PathBuf,
    latest_rotating_slot: Option<usize>,
    memory_states: Vec<Option<SaveState>>,
    memory_start_frame: u64,
    memory_current_frame: u64,
    memory_end_frame: u64,
}

impl StateController {
    pub fn new(game_dir: PathBuf) -> StateController {
        StateController {
            game_dir,
            latest_rotating_slot: None,
            memory_states: vec![None; MEMORY_SAVES_COUNT],
            memory_start_frame: 0,
            memory_current_frame: 0,
            memory_end_frame: 0,
        }
    }

    #[inline]
    pub fn game_dir(&self) -> &Path {
        &self.game_dir
    }

    pub fn slot_dir(&self, slot: usize) -> PathBuf {
        self.game_dir.join(slot.to_string())
    }

    pub fn state_file(&self, slot: usize) -> PathBuf {
        self.slot_dir(slot).join(STATE_FILE_NAME)
    }

    pub fn screenshot_file(&self, slot: usize) -> PathBuf {
        self.slot_dir(slot).join(SCREENSHOT_FILE_NAME)
    }

    pub fn has_state(&self, slot: usize) -> bool {
        slot < MAX_SLOTS && self.state_file(slot).is_file()
    }

    /// Slots that currently hold a state, in ascending order.
    pub fn save_slots(&self) -> Vec<usize> {
        (0..MAX_SLOTS).filter(|slot| self.has_state(*slot)).collect()
    }

    /// Writes `state` and a screenshot of `screen` into `slot`.
    pub fn save_state(&mut self, slot: usize, state: &SaveState, screen: &Screen) -> Result<(), EdgeError> {
        ensure!(slot < MAX_SLOTS, InvalidSlotSnafu { slot });

        let dir = self.slot_dir(slot);
        std::fs::create_dir_all(&dir).context(SaveStateIoSnafu { path: dir.clone() })?;

        let path = self.state_file(slot);
        std::fs::write(&path, state.to_bytes()).context(SaveStateIoSnafu { path: path.clone() })?;
        screen.save_screenshot(&self.screenshot_file(slot))?;

        if slot != MAIN_SLOT {
            self.latest_rotating_slot = Some(slot);
        }
        info!("Saved state to slot {} ({})", slot, path.display());
        Ok(())
    }

    pub fn load_slot(&mut self, slot: usize) -> Result<SaveState, EdgeError> {
        ensure!(slot < MAX_SLOTS, InvalidSlotSnafu { slot });
        ensure!(self.has_state(slot), MissingSlotSnafu { slot });

        let path = self.state_file(slot);
        let data = std::fs::read(&path).context(SaveStateIoSnafu { path: path.clone() })?;
        let state = SaveState::from_bytes(&data)?;

        if slot != MAIN_SLOT {
            self.latest_rotating_slot = Some(slot);
        }
        info!("Loaded state from slot {}", slot);
        Ok(state)
    }

    pub fn delete_state(&mut self, slot: usize) -> Result<(), EdgeError> {
        ensure!(slot < MAX_SLOTS, InvalidSlotSnafu { slot });
        if !self.has_state(slot) {
            return Ok(());
        }

        let dir = self.slot_dir(slot);
        std::fs::remove_dir_all(&dir).context(SaveStateIoSnafu { path: dir })?;
        if self.latest_rotating_slot == Some(slot) {
            self.latest_rotating_slot = None;
        }
        info!("Deleted state in slot {}", slot);
        Ok(())
    }

    /// The most recently written slot among the rotating ones.
    pub fn rotating_slot(&self) -> Option<usize> {
        let mut latest: Option<(usize, SystemTime)> = None;

        for slot in (MAIN_SLOT + 1..MAX_SLOTS).filter(|slot| self.has_state(*slot)) {
            let modified = match std::fs::metadata(self.state_file(slot)).and_then(|metadata| metadata.modified()) {
                Ok(modified) => modified,
                Err(error) => {
                    warn!("Could not get modification time of slot {}: {}", slot, error);
                    continue;
                }
            };

            if latest.map_or(true, |(_, time)| modified > time) {
                latest = Some((slot, modified));
            }
        }

        latest.map(|(slot, _)| slot)
    }

    pub fn next_rotating_slot(&self) -> usize {
        match self.rotating_slot() {
            None => MAIN_SLOT + 1,
            Some(slot) => match (slot + 1) % MAX_SLOTS {
                MAIN_SLOT => MAIN_SLOT + 1,
                next => next,
            },
        }
    }

    pub fn save_rotating_slot(&mut self, state: &SaveState, screen: &Screen) -> Result<usize, EdgeError> {
        let slot = self.next_rotating_slot();
        self.save_state(slot, state, screen)?;
        Ok(slot)
    }

    /// Loads the rotating slot last saved or loaded in this session, if any.
    pub fn load_latest_rotating_slot(&mut self) -> Result<Option<SaveState>, EdgeError> {
        match self.latest_rotating_slot {
            Some(slot) => self.load_slot(slot).map(Some),
            None => Ok(None),
        }
    }

    #[inline]
    pub fn is_save_frame(frame: u64) -> bool {
        frame % SAVE_INTERVAL_FRAMES == 0
    }

    /// Called on save frames: writes the main slot and keeps the state for rewinding.
    pub fn finished_frame(&mut self, frame: u64, state: SaveState, screen: &Screen) -> Result<(), EdgeError> {
        if !Self::is_save_frame(frame) {
            return Ok(());
        }

        self.save_state(MAIN_SLOT, &state, screen)?;
        self.remember(frame, state);
        Ok(())
    }

    /// Stores a snapshot in the rewind ring without touching the disk.
    pub fn remember(&mut self, frame: u64, state: SaveState) {
        self.memory_current_frame = frame;
        self.memory_end_frame = self.memory_end_frame.max(frame);

        let position = Self::memory_position(frame);
        self.memory_states[position] = Some(state);

        let window = (MEMORY_SAVES_COUNT as u64 - 1) * SAVE_INTERVAL_FRAMES;
        self.memory_start_frame = self.memory_end_frame.saturating_sub(window);
    }

    /// Picks the snapshot about two seconds before the current one. Returns its frame and state.
    pub fn go_back_in_memory(&mut self) -> Option<(u64, SaveState)> {
        let target = self
            .memory_current_frame
            .saturating_sub(REWIND_FRAMES)
            .max(self.memory_start_frame);

        let state = self.memory_states[Self::memory_position(target)].clone()?;
        info!(
            "Rewinding to frame {} (kept {}..={})",
            target, self.memory_start_frame, self.memory_end_frame
        );
        self.memory_current_frame = target;
        Some((target, state))
    }

    #[inline]
    fn memory_position(frame: u64) -> usize {
        ((frame / SAVE_INTERVAL_FRAMES) % MEMORY_SAVES_COUNT as u64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::save_state::tests::sample_state;
    use crate::video::palette::ScreenStyle;
    use std::fs::File;
    use std::time::Duration;

    fn touch(controller: &StateController, slot: usize, seconds: u64) {
        let file = File::options().write(true).open(controller.state_file(slot)).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(seconds))
            .unwrap();
    }

    #[test]
    fn slots_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = StateController::new(dir.path().join("TETRIS"));
        let screen = Screen::new(ScreenStyle::White);
        let state = sample_state();

        assert!(controller.save_slots().is_empty());
        controller.save_state(3, &state, &screen).unwrap();

        assert_eq!(controller.save_slots(), vec![3]);
        assert!(controller.screenshot_file(3).is_file());
        assert_eq!(controller.load_slot(3).unwrap(), state);

        controller.delete_state(3).unwrap();
        assert!(!controller.has_state(3));
        assert!(matches!(controller.load_slot(3), Err(EdgeError::MissingSlot { slot: 3 })));
        assert!(matches!(
            controller.save_state(MAX_SLOTS, &state, &screen),
            Err(EdgeError::InvalidSlot { slot: MAX_SLOTS })
        ));
    }

    #[test]
    fn rotating_slot_follows_the_newest_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = StateController::new(dir.path().to_path_buf());
        let screen = Screen::new(ScreenStyle::White);
        let state = sample_state();

        assert_eq!(controller.rotating_slot(), None);
        assert_eq!(controller.next_rotating_slot(), 1);

        for slot in [MAIN_SLOT, 4, 9] {
            controller.save_state(slot, &state, &screen).unwrap();
        }
        touch(&controller, MAIN_SLOT, 3_000);
        touch(&controller, 4, 1_000);
        touch(&controller, 9, 2_000);

        assert_eq!(controller.rotating_slot(), Some(9), "the main slot never rotates");
        assert_eq!(controller.next_rotating_slot(), 1, "wraps past the main slot");

        touch(&controller, 4, 4_000);
        assert_eq!(controller.next_rotating_slot(), 5);
    }

    #[test]
    fn latest_rotating_slot_is_tracked_per_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = StateController::new(dir.path().to_path_buf());
        let screen = Screen::new(ScreenStyle::Green);
        let state = sample_state();

        assert_eq!(controller.load_latest_rotating_slot().unwrap(), None);
        assert_eq!(controller.save_rotating_slot(&state, &screen).unwrap(), 1);
        assert_eq!(controller.load_latest_rotating_slot().unwrap(), Some(state));
    }

    #[test]
    fn main_slot_is_saved_on_interval_frames_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = StateController::new(dir.path().to_path_buf());
        let screen = Screen::new(ScreenStyle::White);

        controller.finished_frame(SAVE_INTERVAL_FRAMES - 1, sample_state(), &screen).unwrap();
        assert!(!controller.has_state(MAIN_SLOT));

        controller.finished_frame(SAVE_INTERVAL_FRAMES, sample_state(), &screen).unwrap();
        assert!(controller.has_state(MAIN_SLOT));
    }

    #[test]
    fn rewind_steps_back_two_seconds_until_the_oldest_snapshot() {
        let mut controller = StateController::new(PathBuf::from("unused"));
        for index in 0..3u64 {
            let mut state = sample_state();
            state.timer.tima = index as u8;
            controller.remember(index * SAVE_INTERVAL_FRAMES, state);
        }

        let (frame, state) = controller.go_back_in_memory().unwrap();
        assert_eq!(frame, 2 * SAVE_INTERVAL_FRAMES - REWIND_FRAMES);
        assert_eq!(state.timer.tima, 1);

        // Snapshots are coarser than a rewind step
        let mut frame = frame;
        while frame >= SAVE_INTERVAL_FRAMES {
            let (previous, state) = controller.go_back_in_memory().unwrap();
            assert_eq!(previous, frame - REWIND_FRAMES);
            assert_eq!(state.timer.tima, (previous / SAVE_INTERVAL_FRAMES) as u8);
            frame = previous;
        }

        while frame > 0 {
            frame = controller.go_back_in_memory().unwrap().0;
        }
        assert_eq!(controller.go_back_in_memory().unwrap().0, 0, "stops at the oldest snapshot");
    }

    #[test]
    fn rewind_without_snapshots_does_nothing() {
        let mut controller = StateController::new(PathBuf::from("unused"));
        assert!(controller.go_back_in_memory().is_none());
    }
}

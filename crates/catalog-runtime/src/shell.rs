//! `catalog-admin shell`: line-oriented admin session.
//!
//! Stdin lines, gate countdowns and invoker completions are multiplexed in one
//! `select!` loop and handled one at a time. Destructive and saving commands go
//! through the [`GateBoard`]: the first run arms, the same command again within
//! the confirmation window runs it.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use catalog_client::CatalogApi;
use catalog_core::display::{
    self, CREATE_ALBUM_LABELS, CREATE_SONG_LABELS, DELETE_LABELS, GateLabels, UPDATE_ALBUM_LABELS,
    UPDATE_SONG_LABELS,
};
use catalog_core::{Album, AlbumDraft, EntityKind, FormErrors, Song, SongDraft, Subject};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::board::{BoardUpdate, DisarmReason, GateBoard};
use crate::command::{self, ShellCommand};
use crate::invoker::{Action, RefreshScope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn labels_for(action: &Action) -> &'static GateLabels {
    match action {
        Action::DeleteAlbum(_) | Action::DeleteSong(_) => &DELETE_LABELS,
        Action::CreateAlbum(_) => &CREATE_ALBUM_LABELS,
        Action::UpdateAlbum(..) => &UPDATE_ALBUM_LABELS,
        Action::CreateSong(_) => &CREATE_SONG_LABELS,
        Action::UpdateSong(..) => &UPDATE_SONG_LABELS,
    }
}

pub struct Shell<W: Write> {
    api: Arc<dyn CatalogApi>,
    board: GateBoard,
    albums: Vec<Album>,
    songs: Vec<Song>,
    out: W,
}

impl<W: Write> Shell<W> {
    pub fn new(api: Arc<dyn CatalogApi>, confirm_timeout: Duration, out: W) -> Self {
        let board = GateBoard::new(Arc::clone(&api), confirm_timeout);
        Self {
            api,
            board,
            albums: Vec::new(),
            songs: Vec::new(),
            out,
        }
    }

    pub fn board(&self) -> &GateBoard {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut GateBoard {
        &mut self.board
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub async fn handle_line(&mut self, line: &str) -> std::io::Result<Flow> {
        match command::parse(line) {
            Ok(Some(cmd)) => self.execute(cmd).await,
            Ok(None) => Ok(Flow::Continue),
            Err(e) => {
                writeln!(self.out, "error: {e}")?;
                Ok(Flow::Continue)
            }
        }
    }

    pub async fn execute(&mut self, cmd: ShellCommand) -> std::io::Result<Flow> {
        match cmd {
            ShellCommand::List(EntityKind::Album) => self.refresh(RefreshScope::Albums).await?,
            ShellCommand::List(EntityKind::Song) => self.refresh(RefreshScope::Songs).await?,
            ShellCommand::Delete(subject) => {
                let action = match (subject.kind(), subject.id()) {
                    (EntityKind::Album, Some(id)) => Action::DeleteAlbum(id),
                    (EntityKind::Song, Some(id)) => Action::DeleteSong(id),
                    (_, None) => return Ok(Flow::Continue),
                };
                self.request(action)?;
            }
            ShellCommand::Add { kind, fields } => {
                let built = match kind {
                    EntityKind::Album => {
                        let mut draft = AlbumDraft::default();
                        command::apply_album_fields(&mut draft, &fields)
                            .map(|()| draft.validate().map(Action::CreateAlbum))
                    }
                    EntityKind::Song => {
                        let mut draft = SongDraft::default();
                        command::apply_song_fields(&mut draft, &fields)
                            .map(|()| draft.validate().map(Action::CreateSong))
                    }
                };
                self.submit(Subject::New(kind), built)?;
            }
            ShellCommand::Edit { kind, id, fields } => {
                let built = match kind {
                    EntityKind::Album => {
                        let Some(album) = self.find_album(id).await else {
                            writeln!(self.out, "album {id} not found")?;
                            return Ok(Flow::Continue);
                        };
                        let mut draft = AlbumDraft::from_album(&album);
                        command::apply_album_fields(&mut draft, &fields)
                            .map(|()| draft.validate().map(|d| Action::UpdateAlbum(id, d)))
                    }
                    EntityKind::Song => {
                        let Some(song) = self.find_song(id).await else {
                            writeln!(self.out, "song {id} not found")?;
                            return Ok(Flow::Continue);
                        };
                        let mut draft = SongDraft::from_song(&song);
                        command::apply_song_fields(&mut draft, &fields)
                            .map(|()| draft.validate().map(|d| Action::UpdateSong(id, d)))
                    }
                };
                self.submit(Subject::Existing { kind, id }, built)?;
            }
            ShellCommand::Cancel(Some(subject)) => {
                let update = self.board.cancel(subject);
                if update == BoardUpdate::Unchanged {
                    writeln!(self.out, "{subject}: nothing to cancel")?;
                }
                self.render(&update)?;
            }
            ShellCommand::Cancel(None) => {
                for update in self.board.cancel_all() {
                    self.render(&update)?;
                }
            }
            ShellCommand::Status => self.print_status()?,
            ShellCommand::Help => writeln!(self.out, "{}", command::HELP)?,
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Apply a timer or invoker update: render it and, on success, refresh
    /// the lists it invalidated.
    pub async fn apply(&mut self, update: BoardUpdate) -> std::io::Result<()> {
        self.render(&update)?;
        if let BoardUpdate::Succeeded(success) = &update {
            for &scope in success.refresh {
                self.refresh(scope).await?;
            }
        }
        Ok(())
    }

    pub async fn refresh(&mut self, scope: RefreshScope) -> std::io::Result<()> {
        let table = match scope {
            RefreshScope::Albums => match self.api.list_albums().await {
                Ok(albums) => {
                    self.albums = albums;
                    display::format_albums_table(&self.albums)
                }
                Err(e) => format!("Error loading albums: {}", e.user_message()),
            },
            RefreshScope::Songs => match self.api.list_songs().await {
                Ok(songs) => {
                    self.songs = songs;
                    display::format_songs_table(&self.songs)
                }
                Err(e) => format!("Error loading songs: {}", e.user_message()),
            },
        };
        self.dispose_vanished_rows(scope);
        writeln!(self.out, "{table}")
    }

    fn request(&mut self, action: Action) -> std::io::Result<()> {
        let update = self.board.edit(action.clone());
        self.render(&update)?;
        let update = self.board.request(action);
        self.render(&update)
    }

    /// A form was (re)submitted. Invalid input counts as an input change, so
    /// an armed gate for the form disarms; a pending one keeps running.
    fn submit(
        &mut self,
        subject: Subject,
        built: Result<Result<Action, FormErrors>, command::CommandError>,
    ) -> std::io::Result<()> {
        match built {
            Ok(Ok(action)) => self.request(action),
            Ok(Err(errors)) => {
                let update = self.board.disarm(subject);
                self.render(&update)?;
                for (_, message) in errors.iter() {
                    writeln!(self.out, "invalid {}: {message}", subject.kind())?;
                }
                Ok(())
            }
            Err(e) => {
                let update = self.board.disarm(subject);
                self.render(&update)?;
                writeln!(self.out, "error: {e}")
            }
        }
    }

    fn render(&mut self, update: &BoardUpdate) -> std::io::Result<()> {
        let window = self.board.timeout().as_millis().div_ceil(1000);
        match update {
            BoardUpdate::Armed { subject, .. } => {
                let verb = self
                    .board
                    .active()
                    .into_iter()
                    .find(|(s, ..)| s == subject)
                    .map_or("run", |(_, action, _)| action.verb());
                writeln!(
                    self.out,
                    "{verb} {subject}? repeat the command within {window}s to confirm"
                )
            }
            BoardUpdate::Confirmed { subject } => {
                let label = self
                    .board
                    .active()
                    .into_iter()
                    .find(|(s, ..)| s == subject)
                    .map(|(_, action, status)| display::gate_label(labels_for(action), status));
                writeln!(self.out, "{subject}: {}", label.unwrap_or_default())
            }
            BoardUpdate::Ignored { subject } => {
                writeln!(self.out, "{subject}: already in progress")
            }
            BoardUpdate::Disarmed { subject, reason } => {
                let why = match reason {
                    DisarmReason::Expired => "confirmation timed out",
                    DisarmReason::Cancelled => "cancelled",
                    DisarmReason::InputChanged => "input changed, confirmation reset",
                };
                writeln!(self.out, "{subject}: {why}")
            }
            BoardUpdate::Succeeded(success) => writeln!(self.out, "{}", success.summary),
            BoardUpdate::Failed(failure) => writeln!(self.out, "error: {}", failure.message),
            BoardUpdate::Unchanged => Ok(()),
        }
    }

    fn print_status(&mut self) -> std::io::Result<()> {
        let lines: Vec<String> = self
            .board
            .active()
            .into_iter()
            .map(|(subject, action, status)| {
                format!("{subject}: {}", display::gate_label(labels_for(action), status))
            })
            .collect();
        if lines.is_empty() {
            return writeln!(self.out, "no armed or pending actions");
        }
        for line in lines {
            writeln!(self.out, "{line}")?;
        }
        Ok(())
    }

    async fn find_album(&mut self, id: i64) -> Option<Album> {
        if !self.albums.iter().any(|a| a.id == id) {
            if let Ok(albums) = self.api.list_albums().await {
                self.albums = albums;
            }
        }
        self.albums.iter().find(|a| a.id == id).cloned()
    }

    async fn find_song(&mut self, id: i64) -> Option<Song> {
        if !self.songs.iter().any(|s| s.id == id) {
            if let Ok(songs) = self.api.list_songs().await {
                self.songs = songs;
            }
        }
        self.songs.iter().find(|s| s.id == id).cloned()
    }

    /// Rows that disappeared from a refreshed list take their gates with them.
    fn dispose_vanished_rows(&mut self, scope: RefreshScope) {
        let (kind, live): (EntityKind, Vec<i64>) = match scope {
            RefreshScope::Albums => (EntityKind::Album, self.albums.iter().map(|a| a.id).collect()),
            RefreshScope::Songs => (EntityKind::Song, self.songs.iter().map(|s| s.id).collect()),
        };
        self.board.retain(|subject| match subject {
            Subject::Existing { kind: k, id } if k == kind => live.contains(&id),
            _ => true,
        });
    }
}

/// Drive `shell` from `input` until `quit`, end of input, or Ctrl-C.
pub async fn run<R, W>(shell: &mut Shell<W>, input: R, prompt: bool) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    shell.refresh(RefreshScope::Albums).await?;

    loop {
        if prompt {
            write!(shell.out, "> ")?;
            shell.out.flush()?;
        }
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if shell.handle_line(&line).await? == Flow::Quit {
                    break;
                }
            }
            Some(event) = shell.board.next_event() => {
                let update = shell.board.handle_event(event);
                if prompt {
                    writeln!(shell.out)?;
                }
                shell.apply(update).await?;
            }
            _ = tokio::signal::ctrl_c() => {
                writeln!(shell.out)?;
                break;
            }
        }
    }

    for update in shell.board.cancel_all() {
        shell.render(&update)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCatalog;

    fn shell(api: &Arc<MemoryCatalog>) -> Shell<Vec<u8>> {
        Shell::new(Arc::clone(api) as Arc<dyn CatalogApi>, Duration::from_secs(5), Vec::new())
    }

    fn text(shell: &Shell<Vec<u8>>) -> String {
        String::from_utf8_lossy(shell.output()).into_owned()
    }

    fn revolver() -> Arc<MemoryCatalog> {
        Arc::new(
            MemoryCatalog::new()
                .with_album("Revolver", "1966-08-05")
                .with_song(42, "Taxman", 1),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn delete_twice_runs_once_and_refreshes() {
        let api = revolver();
        let mut sh = shell(&api);

        sh.handle_line("delete song 42").await.expect("io");
        sh.handle_line("delete song 42").await.expect("io");
        let event = sh.board_mut().next_event().await.expect("completion");
        let update = sh.board_mut().handle_event(event);
        sh.apply(update).await.expect("io");

        let out = text(&sh);
        assert!(out.contains("delete song 42? repeat the command within 5s to confirm"));
        assert!(out.contains("song 42: Deleting..."));
        assert!(out.contains("song 42 deleted"));
        assert!(out.contains("No songs found"));
        assert_eq!(api.calls(), vec!["DELETE /songs/42", "GET /songs"]);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_form_reports_errors_without_arming() {
        let api = revolver();
        let mut sh = shell(&api);

        sh.handle_line("add album title=Rubber").await.expect("io");
        assert!(text(&sh).contains("invalid album: Release date is required"));
        assert!(sh.board().active().is_empty());
        assert!(api.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn changed_edit_rearms() {
        let api = revolver();
        let mut sh = shell(&api);

        sh.handle_line("edit album 1 title=Rubber").await.expect("io");
        sh.handle_line(r#"edit album 1 title="Rubber Soul""#)
            .await
            .expect("io");

        let out = text(&sh);
        assert!(out.contains("album 1: input changed, confirmation reset"));
        assert_eq!(out.matches("update album 1?").count(), 2);
        assert_eq!(sh.board().phase(Subject::album(1)), catalog_core::GatePhase::Armed);
        assert!(!api.calls().iter().any(|c| c.starts_with("PUT")));
    }

    #[tokio::test(start_paused = true)]
    async fn status_and_cancel() {
        let api = revolver();
        let mut sh = shell(&api);

        sh.handle_line("status").await.expect("io");
        sh.handle_line("rm album 1").await.expect("io");
        tokio::time::advance(Duration::from_millis(1200)).await;
        sh.handle_line("status").await.expect("io");
        sh.handle_line("cancel").await.expect("io");
        sh.handle_line("cancel album 1").await.expect("io");

        let out = text(&sh);
        assert!(out.contains("no armed or pending actions"));
        assert!(out.contains("album 1: \u{2713} Confirm (4s)"));
        assert!(out.contains("album 1: cancelled"));
        assert!(out.contains("album 1: nothing to cancel"));
    }

    #[tokio::test(start_paused = true)]
    async fn run_reads_until_quit() {
        let api = revolver();
        let mut sh = shell(&api);

        run(&mut sh, &b"songs\nbogus\nquit\nalbums\n"[..], false)
            .await
            .expect("run");

        let out = text(&sh);
        assert!(out.contains("Revolver"));
        assert!(out.contains("Taxman"));
        assert!(out.contains("unknown command: bogus"));
        assert_eq!(api.calls(), vec!["GET /albums", "GET /songs"]);
    }

    fn slow_revolver(latency_ms: u64) -> Arc<MemoryCatalog> {
        Arc::new(
            MemoryCatalog::new()
                .with_album("Revolver", "1966-08-05")
                .with_song(42, "Taxman", 1)
                .with_latency(Duration::from_millis(latency_ms)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_resubmit_keeps_pending_create_in_flight() {
        let api = slow_revolver(1000);
        let mut sh = shell(&api);
        let valid = "add album title=Rubber date=1965-12-03";

        sh.handle_line(valid).await.expect("io");
        sh.handle_line(valid).await.expect("io");
        sh.handle_line("add album title=Rubber").await.expect("io");
        assert_eq!(
            sh.board().phase(Subject::New(EntityKind::Album)),
            catalog_core::GatePhase::Pending
        );
        sh.handle_line(valid).await.expect("io");
        sh.handle_line(valid).await.expect("io");

        let event = sh.board_mut().next_event().await.expect("completion");
        let update = sh.board_mut().handle_event(event);
        sh.apply(update).await.expect("io");

        let out = text(&sh);
        assert!(out.contains("invalid album: Release date is required"));
        assert_eq!(out.matches("new album: already in progress").count(), 2);
        assert!(out.contains("created: Rubber"));
        let posts = api.calls().iter().filter(|c| *c == "POST /albums").count();
        assert_eq!(posts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn vanished_row_drops_completion_for_recreated_gate() {
        let api = slow_revolver(1000);
        let mut sh = shell(&api);

        sh.handle_line("delete song 42").await.expect("io");
        sh.handle_line("delete song 42").await.expect("io");
        // The call lands and queues its completion; the list refresh sees
        // the row gone first and disposes the gate.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        sh.handle_line("songs").await.expect("io");

        sh.handle_line("delete song 42").await.expect("io");
        sh.handle_line("delete song 42").await.expect("io");
        let stale = sh.board_mut().next_event().await.expect("stale completion");
        assert_eq!(sh.board_mut().handle_event(stale), BoardUpdate::Unchanged);
        assert_eq!(
            sh.board().phase(Subject::song(42)),
            catalog_core::GatePhase::Pending
        );

        sh.handle_line("delete song 42").await.expect("io");
        let event = sh.board_mut().next_event().await.expect("completion");
        let update = sh.board_mut().handle_event(event);
        sh.apply(update).await.expect("io");

        let out = text(&sh);
        assert!(out.contains("song 42: already in progress"));
        assert!(out.contains("error: Song not found"));
        assert!(!out.contains("song 42 deleted"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_delete_drops_the_outcome() {
        let api = slow_revolver(1000);
        let mut sh = shell(&api);

        sh.handle_line("delete song 42").await.expect("io");
        sh.handle_line("delete song 42").await.expect("io");
        sh.handle_line("cancel song 42").await.expect("io");

        let event = sh.board_mut().next_event().await.expect("completion");
        let update = sh.board_mut().handle_event(event);
        assert_eq!(update, BoardUpdate::Unchanged);
        sh.apply(update).await.expect("io");

        let out = text(&sh);
        assert!(out.contains("song 42: cancelled"));
        assert!(!out.contains("song 42 deleted"));
        assert_eq!(api.calls(), vec!["DELETE /songs/42"]);
    }

    #[tokio::test(start_paused = true)]
    async fn album_delete_refreshes_songs_too() {
        let api = revolver();
        let mut sh = shell(&api);

        sh.handle_line("delete album 1").await.expect("io");
        sh.handle_line("delete album 1").await.expect("io");
        let event = sh.board_mut().next_event().await.expect("completion");
        let update = sh.board_mut().handle_event(event);
        sh.apply(update).await.expect("io");

        assert!(api.album_ids().is_empty());
        assert_eq!(
            api.calls(),
            vec!["DELETE /albums/1", "GET /albums", "GET /songs"]
        );
        let out = text(&sh);
        assert!(out.contains("No albums found"));
        assert!(out.contains("No songs found"));
    }
}

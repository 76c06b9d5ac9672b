//! Demo widgets used by the command line shell.

use std::{cell::RefCell, rc::Rc};

use widget_shell_core::{Catalogue, ComponentId, ComponentTree, Features, Result, Widget, WidgetFactory};

pub const PLAYLIST: &str = "Playlist";
pub const SONG_READER: &str = "Song reader";
pub const LOGGER: &str = "Logger";

/// Access to the songs a widget is currently showing.
pub trait PlaylistFeature {
    fn songs(&self) -> Vec<String>;
    fn enqueue(&self, song: String);
}

#[derive(Debug, Default)]
pub struct Playlist {
    songs: RefCell<Vec<String>>,
}

impl PlaylistFeature for Playlist {
    fn songs(&self) -> Vec<String> {
        self.songs.borrow().clone()
    }

    fn enqueue(&self, song: String) {
        self.songs.borrow_mut().push(song);
    }
}

pub struct PlaylistView {
    playlist: Rc<Playlist>,
}

impl PlaylistView {
    pub fn new(songs: &[&str]) -> Self {
        let playlist = Rc::new(Playlist::default());
        for song in songs {
            playlist.enqueue((*song).to_string());
        }
        Self { playlist }
    }
}

impl Widget for PlaylistView {
    fn type_name(&self) -> &str {
        "Media.Playlist"
    }

    fn features(&self) -> Features {
        Features::new().with::<dyn PlaylistFeature>(PLAYLIST, self.playlist.clone())
    }

    fn close(&mut self) {
        tracing::info!(songs = self.playlist.songs().len(), "playlist view closed");
    }
}

/// Shows song metadata; it finds its songs through the nearest playlist.
pub struct SongReader;

impl Widget for SongReader {
    fn type_name(&self) -> &str {
        "Media.SongReader"
    }

    fn features(&self) -> Features {
        Features::new().with(SONG_READER, Rc::new(()))
    }
}

impl SongReader {
    /// Songs of the playlist closest to `reader`, or nothing when there is none.
    pub fn read(tree: &ComponentTree, reader: ComponentId) -> Vec<String> {
        tree.find_nearest(reader, PLAYLIST)
            .and_then(|registration| registration.downcast::<dyn PlaylistFeature>())
            .map(|playlist| playlist.songs())
            .unwrap_or_default()
    }
}

/// Collects log lines from other widgets.
#[derive(Debug, Default)]
pub struct LogBook {
    lines: RefCell<Vec<String>>,
}

impl LogBook {
    pub fn log(&self, line: impl Into<String>) {
        self.lines.borrow_mut().push(line.into());
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

pub struct Logger {
    book: Rc<LogBook>,
}

impl Widget for Logger {
    fn type_name(&self) -> &str {
        "Tools.Logger"
    }

    fn features(&self) -> Features {
        Features::new().with(LOGGER, self.book.clone())
    }
}

/// Every widget type the demo shell knows about.
pub fn catalogue(label: &str) -> Result<Catalogue> {
    let mut catalogue = Catalogue::new(label);
    catalogue.register(WidgetFactory::new("Media.Playlist", || {
        Box::new(PlaylistView::new(&[]))
    })?)?;
    catalogue.register(WidgetFactory::new("Media.SongReader", || Box::new(SongReader))?)?;
    catalogue.register(WidgetFactory::new("Tools.Logger", || {
        Box::new(Logger {
            book: Rc::new(LogBook::default()),
        })
    })?)?;
    Ok(catalogue)
}

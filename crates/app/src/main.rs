use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use widget_shell_core::{
    Component, ComponentId, ComponentTree, ContainerKind, HeadlessSurfaces, LayoutDescription,
    Name, ShellConfig, ShellError,
};

mod widgets;

use widgets::{LogBook, PlaylistView, SongReader, LOGGER, PLAYLIST};

fn main() -> widget_shell_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ShellConfig::load(path)?,
        None => ShellConfig::default(),
    };

    match cli.command {
        Commands::Catalogue => run_catalogue(&config),
        Commands::Inspect { layout } => {
            let layout = layout
                .or_else(|| config.layout.clone())
                .ok_or_else(|| ShellError::msg("no layout given and none configured"))?;
            run_inspect(&config, &layout)
        }
        Commands::Demo { save } => run_demo(&config, save.as_deref()),
    }
}

fn run_catalogue(config: &ShellConfig) -> widget_shell_core::Result<()> {
    let catalogue = widgets::catalogue(&config.catalogue_label)?;
    print_name(catalogue.index(), 0);

    for feature in [PLAYLIST, widgets::SONG_READER, LOGGER] {
        if let Some(factory) = catalogue.preferred_for(feature) {
            println!("{feature}: {}", factory.name());
        }
    }
    Ok(())
}

fn run_inspect(config: &ShellConfig, path: &Path) -> widget_shell_core::Result<()> {
    tracing::info!(?path, "inspecting layout");
    let catalogue = widgets::catalogue(&config.catalogue_label)?;
    let description = LayoutDescription::load(path)?;

    let mut tree = description
        .restore(&catalogue)?
        .with_surfaces(HeadlessSurfaces::new());
    let root = tree.root();
    tree.load(root)?;
    tree.show(root);

    print_component(&tree, root, 0);
    for feature in tree.features().names() {
        let owners: Vec<String> = tree
            .find(feature)
            .map(|registration| registration.owner().to_string())
            .collect();
        println!("{feature}: {}", owners.join(", "));
    }
    Ok(())
}

fn run_demo(config: &ShellConfig, save: Option<&Path>) -> widget_shell_core::Result<()> {
    tracing::info!(root = ?config.root_kind, "starting demo");
    let surfaces = HeadlessSurfaces::new();
    let mut tree = ComponentTree::new(config.root_kind).with_surfaces(surfaces.clone());
    let root = tree.root();
    tree.load(root)?;

    let host = demo_host(&mut tree)?;
    tree.load(host)?;

    let playlist = tree.create_widget(Box::new(PlaylistView::new(&[
        "Opening.flac",
        "Interlude.flac",
    ])))?;
    let playlist_key = tree.get_empty_spot(host).unwrap_or(0);
    tree.add_child(host, playlist_key, Some(playlist))?;

    let reader = tree.create_widget(Box::new(SongReader))?;
    let reader_key = tree.get_empty_spot(host).unwrap_or(playlist_key + 1);
    tree.add_child(host, reader_key, Some(reader))?;

    let catalogue = widgets::catalogue(&config.catalogue_label)?;
    let logger_key = tree.get_empty_spot(host).unwrap_or(reader_key + 1);
    if let Err(err) =
        LayoutDescription::widget("Tools.Logger").restore_into(&mut tree, host, logger_key, &catalogue)
    {
        tracing::warn!(%err, "no room for a logger");
    }

    let songs = SongReader::read(&tree, reader);
    println!("reader sees {} song(s): {}", songs.len(), songs.join(", "));
    log_to_all(&tree, format!("reader attached with {} song(s)", songs.len()));

    if let Some(path) = save {
        LayoutDescription::snapshot(&tree).save(path)?;
        tracing::info!(?path, "saved layout");
    }

    tree.remove_child(host, playlist_key);
    let songs = SongReader::read(&tree, reader);
    println!("after removing the playlist the reader sees {} song(s)", songs.len());
    log_to_all(&tree, "playlist removed");

    for book in tree.find_as::<LogBook>(LOGGER) {
        for line in book.lines() {
            println!("log: {line}");
        }
    }
    println!("surface events: {}", surfaces.events().len());
    Ok(())
}

/// Container the demo widgets go into. A single-slot root cannot hold them
/// side by side, so it gets a stack of its own.
fn demo_host(tree: &mut ComponentTree) -> widget_shell_core::Result<ComponentId> {
    let root = tree.root();
    if tree.kind(root) != Some(ContainerKind::Uni) {
        return Ok(root);
    }
    let stack = tree.create_container(ContainerKind::Stack);
    let key = tree.get_empty_spot(root).unwrap_or(1);
    tree.add_child(root, key, Some(stack))?;
    Ok(stack)
}

fn log_to_all(tree: &ComponentTree, line: impl Into<String>) {
    let line = line.into();
    for book in tree.find_as::<LogBook>(LOGGER) {
        book.log(line.clone());
    }
}

fn print_name(name: &Name, depth: usize) {
    let indent = "  ".repeat(depth);
    if name.path().is_empty() {
        println!("{indent}{}", name.value());
    } else {
        println!("{indent}{} ({})", name.value(), name.path());
    }
    for child in name.children() {
        print_name(child, depth + 1);
    }
}

fn print_component(tree: &ComponentTree, id: ComponentId, depth: usize) {
    let indent = "  ".repeat(depth);
    let key = tree
        .key_of(id)
        .map(|key| format!("[{key}] "))
        .unwrap_or_default();
    match tree.component(id) {
        Some(Component::Container { kind, .. }) => {
            println!("{indent}{key}{id} container {kind:?}");
            for (_, child) in tree.children(id) {
                print_component(tree, child, depth + 1);
            }
        }
        Some(Component::Widget(widget)) => {
            let features = tree.features().features_of(id).join(", ");
            println!("{indent}{key}{id} {} [{features}]", widget.type_name());
        }
        None => {}
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Skinnable widget shell", long_about = None)]
struct Cli {
    /// Optional JSON configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the catalogue of available widget types.
    Catalogue,
    /// Restore a persisted layout and print its tree and features.
    Inspect {
        /// Layout file; defaults to the one named in the configuration.
        layout: Option<PathBuf>,
    },
    /// Attach a playlist and a song reader, then detach the playlist.
    Demo {
        /// Write the layout to this path before the playlist is removed.
        #[arg(short, long)]
        save: Option<PathBuf>,
    },
}

//! Subcommand handlers.

use crate::cli::{Command, Target};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::Serialize;
use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use unref_assetdb::MetaIndex;
use unref_config::Config;
use unref_library::quarantine::{Delete, Failure, Move, Restore};
use unref_library::scan::Skipped;
use unref_library::{ReplaceReport, ScanResult, ScanSummary, Session, Strategy, UsageVerdict, UuidMap};

/// Ask a yes/no question on the terminal until it gets an answer. An empty
/// answer picks `default`, if there is one.
pub fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();
    loop {
        input.clear();
        match default {
            Some(true) => print!("{prompt} (Y/n): "),
            Some(false) | None => print!("{prompt} (y/N): "),
        }
        io::stdout().flush()?;
        if io::stdin().read_line(&mut input)? == 0 {
            // End of input counts as "no".
            return Ok(false);
        }
        match input.trim().to_ascii_uppercase().as_str() {
            "Y" | "YES" => return Ok(true),
            "N" | "NO" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).or_raise(|| ErrorKind::Output)?;
    println!("{json}");
    Ok(())
}

fn strategy_label(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::Indexed => "indexed",
        Strategy::FileSearch => "file search",
    }
}

fn print_failures(failures: &[Failure]) {
    for failure in failures {
        println!("  failed  {}: {}", failure.path.display(), failure.reason);
    }
}

/// Folder name the engine keeps a project's assets under.
const ASSETS_DIR: &str = "assets";

/// The nearest folder named `assets` enclosing `folder`, `folder` included.
fn assets_ancestor(folder: &Path) -> Option<&Path> {
    folder.ancestors().find(|dir| dir.file_name() == Some(OsStr::new(ASSETS_DIR)))
}

/// Project root used to resolve identifiers. Without one configured, it is
/// the directory holding the enclosing `assets` folder, or else the scanned
/// folder's parent.
fn project_root(config: &Config, folder: &Path) -> PathBuf {
    config
        .project_root
        .clone()
        .or_else(|| assets_ancestor(folder).and_then(Path::parent).map(Path::to_path_buf))
        .or_else(|| folder.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| folder.to_path_buf())
}

/// Where references are searched for when `--search` isn't given. Assets in
/// one folder are routinely used by scenes in another, so the whole `assets`
/// tree is searched rather than the scanned folder alone.
fn default_search_root(config: &Config, folder: &Path) -> Option<PathBuf> {
    config.effective_search_root().or_else(|| assets_ancestor(folder).map(Path::to_path_buf))
}

async fn open_session(config: &Config, target: &Target) -> Result<Session> {
    let session = |root: PathBuf| Session::new(Arc::new(MetaIndex::new(root)), config.session_options());
    match target {
        Target::Path(path) => {
            let folder = fs::canonicalize(path).await.or_raise(|| ErrorKind::Folder(path.clone()))?;
            let session = session(project_root(config, &folder));
            session.select(folder).await;
            Ok(session)
        },
        Target::Id(id) => {
            let root = match &config.project_root {
                Some(root) => root.clone(),
                None => std::env::current_dir().or_raise(|| ErrorKind::Project)?,
            };
            let session = session(root);
            session.select_id(id).await.or_raise(|| ErrorKind::Asset(id.clone()))?;
            Ok(session)
        },
    }
}

async fn search_root(session: &Session, config: &Config, search: Option<&Target>) -> Result<Option<PathBuf>> {
    match search {
        Some(Target::Path(path)) => Ok(Some(path.clone())),
        Some(Target::Id(id)) => session.resolve_id(id).await.map(Some).or_raise(|| ErrorKind::Asset(id.clone())),
        None => Ok(session.folder().await.and_then(|folder| default_search_root(config, &folder))),
    }
}

async fn scan(session: &Session, search: Option<&Path>) -> Result<Arc<ScanResult>> {
    session
        .scan(search, |index, total, name| {
            tracing::debug!(index, total, name, "Checking");
        })
        .await
        .or_raise(|| ErrorKind::Scan)
}

#[derive(Serialize)]
struct ScanReport<'a> {
    folder: &'a Path,
    search_root: &'a Path,
    summary: &'a ScanSummary,
    verdicts: Vec<&'a UsageVerdict>,
    skipped: &'a [Skipped],
}

fn print_summary(summary: &ScanSummary) {
    println!(
        "{} assets checked in {:.2?} ({}): {} used, {} unused, {} excluded, {} unreadable",
        summary.total,
        summary.elapsed,
        strategy_label(summary.strategy),
        summary.used,
        summary.unused,
        summary.excluded,
        summary.skipped,
    );
}

fn print_scan(result: &ScanResult, json: bool, unused_only: bool) -> Result<()> {
    let verdicts: Vec<&UsageVerdict> = result.verdicts.iter().filter(|v| !unused_only || !v.is_used()).collect();
    if json {
        return print_json(&ScanReport {
            folder: &result.folder,
            search_root: &result.search_root,
            summary: &result.summary,
            verdicts,
            skipped: &result.skipped,
        });
    }
    for verdict in verdicts {
        let path = verdict.relative_path().display();
        match (verdict.references().len(), verdict.used_as_dependency()) {
            (0, false) => println!("unused  {path}"),
            (0, true) => println!("used    {path} (dependency)"),
            (1, _) => println!("used    {path} (1 reference)"),
            (n, _) => println!("used    {path} ({n} references)"),
        }
    }
    print_summary(&result.summary);
    Ok(())
}

async fn move_unused(session: &Session, search: Option<&Path>, yes: bool) -> Result<()> {
    let result = scan(session, search).await?;
    print_summary(&result.summary);
    if result.summary.unused == 0 {
        println!("Nothing to move.");
        return Ok(());
    }
    let quarantine = session.quarantine_dir().await.or_raise(|| ErrorKind::Quarantine)?;
    if !yes && fs::try_exists(&quarantine).await.unwrap_or(false) {
        let prompt = format!("{} already exists and will be replaced. Continue?", quarantine.display());
        if !prompt_confirm(&prompt, Some(false)).or_raise(|| ErrorKind::Prompt)? {
            println!("Cancelled.");
            return Ok(());
        }
    }
    match session.move_unused().await.or_raise(|| ErrorKind::Quarantine)? {
        Move::NothingToMove => println!("Nothing to move."),
        Move::Moved { quarantine, replaced_existing, moved, failures, pruned_dirs } => {
            if replaced_existing {
                println!("Replaced the previous quarantine.");
            }
            for path in &moved {
                println!("  moved   {}", path.display());
            }
            print_failures(&failures);
            println!(
                "Moved {} assets to {} ({} failed, {} empty folders removed).",
                moved.len(),
                quarantine.display(),
                failures.len(),
                pruned_dirs,
            );
        },
    }
    Ok(())
}

async fn restore(session: &Session) -> Result<()> {
    match session.restore().await.or_raise(|| ErrorKind::Quarantine)? {
        Restore::NothingToRestore => println!("Nothing to restore."),
        Restore::Restored { restored, failures } => {
            for path in &restored {
                println!("  restored {}", path.display());
            }
            print_failures(&failures);
            println!("Restored {} assets ({} failed).", restored.len(), failures.len());
        },
    }
    Ok(())
}

async fn purge(session: &Session, yes: bool) -> Result<()> {
    let mut prompt_error = None;
    let outcome = session
        .delete(|quarantine| {
            if yes {
                return true;
            }
            let prompt = format!("Permanently delete {}?", quarantine.display());
            prompt_confirm(&prompt, Some(false)).unwrap_or_else(|error| {
                prompt_error = Some(error);
                false
            })
        })
        .await
        .or_raise(|| ErrorKind::Quarantine)?;
    if let Some(error) = prompt_error {
        return Err(error).or_raise(|| ErrorKind::Prompt);
    }
    match outcome {
        Delete::NothingToDelete => println!("Nothing to delete."),
        Delete::Cancelled => println!("Cancelled."),
        Delete::Deleted { quarantine, files } => println!("Deleted {} ({files} assets).", quarantine.display()),
    }
    Ok(())
}

async fn replace(session: &Session, map: &Path) -> Result<()> {
    let map = UuidMap::load(map).await.or_raise(|| ErrorKind::Replace)?;
    let ReplaceReport { processed, modified, replacements, failures } =
        session.replace(&map).await.or_raise(|| ErrorKind::Replace)?;
    print_failures(&failures);
    println!("{replacements} replacements in {modified} of {processed} files ({} failed).", failures.len());
    Ok(())
}

/// Run one subcommand against an already loaded configuration.
pub async fn run(command: Command, config: Config) -> Result<()> {
    let Some(target) = command.folder() else {
        return print_json(&config);
    };
    let session = open_session(&config, target).await?;
    match command {
        Command::Scan { search, json, unused_only, .. } => {
            let search = search_root(&session, &config, search.as_ref()).await?;
            let result = scan(&session, search.as_deref()).await?;
            print_scan(&result, json, unused_only)
        },
        Command::Move { search, yes, .. } => {
            let search = search_root(&session, &config, search.as_ref()).await?;
            move_unused(&session, search.as_deref(), yes).await
        },
        Command::Restore { .. } => restore(&session).await,
        Command::Purge { yes, .. } => purge(&session, yes).await,
        Command::Replace { map, .. } => replace(&session, &map).await,
        Command::Config => print_json(&config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/game/assets/ui/buttons", Some("/game/assets"))]
    #[case("/game/assets", Some("/game/assets"))]
    #[case("/game/assets/old/assets/ui", Some("/game/assets/old/assets"))]
    #[case("/game/textures", None)]
    fn test_assets_ancestor(#[case] folder: &str, #[case] expected: Option<&str>) {
        assert_eq!(assets_ancestor(Path::new(folder)), expected.map(Path::new));
    }

    #[test]
    fn test_project_root_fallback() {
        let mut config = Config::default();
        assert_eq!(project_root(&config, Path::new("/game/assets/ui")), PathBuf::from("/game"));
        assert_eq!(project_root(&config, Path::new("/game/textures")), PathBuf::from("/game"));
        assert_eq!(project_root(&config, Path::new("/")), PathBuf::from("/"));
        config.project_root = Some(PathBuf::from("/elsewhere"));
        assert_eq!(project_root(&config, Path::new("/game/assets")), PathBuf::from("/elsewhere"));
    }

    #[test]
    fn test_default_search_root() {
        let mut config = Config::default();
        let ui = Path::new("/game/assets/ui");
        assert_eq!(default_search_root(&config, ui), Some(PathBuf::from("/game/assets")));
        assert_eq!(default_search_root(&config, Path::new("/loose")), None);
        config.project_root = Some(PathBuf::from("/other"));
        assert_eq!(default_search_root(&config, ui), Some(PathBuf::from("/other/assets")));
        config.search_root = Some(PathBuf::from("/explicit"));
        assert_eq!(default_search_root(&config, ui), Some(PathBuf::from("/explicit")));
    }

    fn asset(root: &Path, relative: &str, content: &str, uuid: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        std::fs::write(root.join(format!("{relative}.meta")), format!(r#"{{"uuid":"{uuid}"}}"#)).unwrap();
    }

    fn project() -> tempfile::TempDir {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        asset(root, "assets/ui/btn.png", "png", "btn");
        asset(root, "assets/ui/stale.png", "png", "stale");
        asset(root, "assets/scenes/main.scene", r#"[{"__uuid__":"btn"}]"#, "main");
        std::fs::write(root.join("assets/ui.meta"), r#"{"uuid":"ui-folder"}"#).unwrap();
        temp_dir
    }

    #[tokio::test]
    async fn test_subfolder_scan_searches_whole_assets_tree() {
        let temp_dir = project();
        let base = std::fs::canonicalize(temp_dir.path()).unwrap();
        let config = Config::default();
        let session = open_session(&config, &Target::Path(base.join("assets/ui"))).await.unwrap();

        let search = search_root(&session, &config, None).await.unwrap();
        assert_eq!(search, Some(base.join("assets")));
        let result = scan(&session, search.as_deref()).await.unwrap();
        let used: Vec<_> = result.verdicts.iter().map(|v| (v.id(), v.is_used())).collect();
        assert_eq!(used, vec![("btn", true), ("stale", false)]);
    }

    #[tokio::test]
    async fn test_folders_resolve_by_identifier() {
        let temp_dir = project();
        let root = temp_dir.path();
        let config = Config { project_root: Some(root.to_path_buf()), ..Default::default() };
        let session = open_session(&config, &Target::Id("ui-folder".to_owned())).await.unwrap();
        assert_eq!(session.folder().await, Some(root.join("assets/ui")));

        let search = search_root(&session, &config, Some(&Target::Id("ui-folder".to_owned()))).await.unwrap();
        assert_eq!(search, Some(root.join("assets/ui")));
        // Searching only the folder itself finds no scene.
        let result = scan(&session, search.as_deref()).await.unwrap();
        assert_eq!(result.summary.used, 0);

        let err = open_session(&config, &Target::Id("nope".to_owned())).await.err().unwrap();
        assert_eq!(*err, ErrorKind::Asset("nope".to_owned()));
    }
}

//! # CLI Command Implementations

use sciencesource::{Config, WikibaseClient};
use sciencesource_core::{
    Article, LabelResolver, Stage, SyncError, TERMINUS_LABEL, TagRegistry, UploadProgress,
    Uploader, Vocabulary, load, save, verify_chain,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum article text size (32 MB).
const MAX_CONTENT_FILE_SIZE: u64 = 32 * 1024 * 1024;

/// Maximum vocabulary cache size (1 MB).
const MAX_VOCABULARY_FILE_SIZE: u64 = 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), SyncError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| SyncError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(SyncError::Serialization(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and require a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, SyncError> {
    let canonical = path.canonicalize().map_err(|e| {
        SyncError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(SyncError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Canonicalize the parent directory of an output path.
fn validate_output_path(path: &Path) -> Result<PathBuf, SyncError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        SyncError::Io(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(SyncError::Io(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| SyncError::Io("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// HELPERS
// =============================================================================

fn connect(config: &Config) -> Result<WikibaseClient, SyncError> {
    if config.token.is_none() {
        tracing::warn!("No access token configured; writes will be rejected by the wiki");
    }
    WikibaseClient::new(config).map_err(|e| SyncError::Io(e.to_string()))
}

fn read_content(path: &Path) -> Result<String, SyncError> {
    let path = validate_file_path(path)?;
    validate_file_size(&path, MAX_CONTENT_FILE_SIZE)?;
    std::fs::read_to_string(&path)
        .map_err(|e| SyncError::Io(format!("Read {}: {}", path.display(), e)))
}

fn load_vocabulary(path: &Path) -> Result<Vocabulary, SyncError> {
    let path = validate_file_path(path)?;
    validate_file_size(&path, MAX_VOCABULARY_FILE_SIZE)?;
    let bytes = std::fs::read(&path)
        .map_err(|e| SyncError::Io(format!("Read {}: {}", path.display(), e)))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        SyncError::Serialization(format!("Invalid vocabulary {}: {}", path.display(), e))
    })
}

fn save_vocabulary(vocabulary: &Vocabulary, path: &Path) -> Result<(), SyncError> {
    let path = validate_output_path(path)?;
    let json = serde_json::to_string_pretty(vocabulary)
        .map_err(|e| SyncError::Serialization(e.to_string()))?;
    std::fs::write(&path, json + "\n")
        .map_err(|e| SyncError::Io(format!("Write {}: {}", path.display(), e)))
}

fn print_json(output: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(output).unwrap_or_default()
    );
}

fn progress_json(progress: &UploadProgress) -> serde_json::Value {
    serde_json::json!({
        "stage": progress.stage.name(),
        "next_stage": progress.stage.next().map(|s| s.name()),
        "progress_percent": progress.percent(),
        "anchor_points": progress.anchor_count,
        "annotations_uploaded": progress.annotations_uploaded,
        "anchors_uploaded": progress.anchors_uploaded,
        "anchors_linked": progress.anchors_linked,
    })
}

fn print_progress(article: &Article, progress: &UploadProgress) {
    println!("Article:      {}", article.title);
    println!("Wiki page:    {}", article.science_source_title);
    if let Some(page) = article.page_id() {
        println!("Page ID:      {}", page);
    }
    if let Some(id) = article.id() {
        println!("Item:         {}", id);
    }
    println!();
    println!("Stage:        {}", progress.stage.name());
    match progress.stage.next() {
        Some(next) => println!("Next:         {} ({}%)", next.name(), progress.percent()),
        None => println!("Next:         (complete)"),
    }
    println!("Anchors:      {}", progress.anchor_count);
    println!("Annotations:  {} uploaded", progress.annotations_uploaded);
    println!("Anchor items: {} uploaded", progress.anchors_uploaded);
    println!("Linked:       {}", progress.anchors_linked);
}

// =============================================================================
// LABELS COMMAND
// =============================================================================

/// List the labels the record schemas use.
pub fn cmd_labels(json_mode: bool) -> Result<(), SyncError> {
    let registry = TagRegistry::standard();

    if json_mode {
        print_json(&serde_json::json!({
            "properties": registry.property_labels(),
            "items": registry.item_labels(),
        }));
        return Ok(());
    }

    println!("Property labels ({})", registry.property_labels().len());
    for label in registry.property_labels() {
        println!("  {}", label);
    }
    println!();
    println!("Item labels ({})", registry.item_labels().len());
    for label in registry.item_labels() {
        println!("  {}", label);
    }
    Ok(())
}

// =============================================================================
// RESOLVE COMMAND
// =============================================================================

/// Resolve every schema label against the wiki.
pub fn cmd_resolve(config: &Config, json_mode: bool, output: Option<&Path>) -> Result<(), SyncError> {
    let client = connect(config)?;
    let vocabulary = LabelResolver::new(&client).resolve(&TagRegistry::standard())?;

    if let Some(path) = output {
        save_vocabulary(&vocabulary, path)?;
        tracing::info!(path = %path.display(), "vocabulary saved");
    }

    if json_mode {
        print_json(&serde_json::json!({
            "url": config.url,
            "properties": vocabulary.properties(),
            "items": vocabulary.items(),
        }));
        return Ok(());
    }

    println!("Vocabulary at {}", config.url);
    println!();
    for (label, id) in vocabulary.properties() {
        println!("  {:<8} {}", id.as_str(), label);
    }
    for (label, id) in vocabulary.items() {
        println!("  {:<8} {}", id.as_str(), label);
    }
    Ok(())
}

// =============================================================================
// UPLOAD COMMAND
// =============================================================================

/// Upload an article graph, saving it after every confirmed stage.
pub fn cmd_upload(
    config: &Config,
    json_mode: bool,
    article_path: &Path,
    content: Option<&Path>,
    vocabulary: Option<&Path>,
    step: bool,
) -> Result<(), SyncError> {
    let article_path = validate_file_path(article_path)?;
    let mut article = load(&article_path)?;
    let content = content.map(read_content).transpose()?;

    // A recorded page id means the text already reached the wiki.
    if article.stage() == Stage::Unsubmitted && article.page_id().is_none() && content.is_none() {
        return Err(SyncError::MissingContent(Stage::Unsubmitted));
    }

    let client = connect(config)?;
    let vocabulary = match vocabulary {
        Some(path) => load_vocabulary(path)?,
        None => LabelResolver::new(&client).resolve(&TagRegistry::standard())?,
    };

    let started = article.stage();
    let uploader = Uploader::new(&client, &vocabulary);
    // Both paths save the graph even when a stage fails part-way.
    let checkpoint = |a: &Article| save(a, &article_path);
    let stage = if step {
        uploader.step(&mut article, content.as_deref(), checkpoint)?
    } else {
        uploader.run(&mut article, content.as_deref(), checkpoint)?
    };

    tracing::info!(
        article = %article.title,
        from = %started,
        to = %stage,
        "upload finished"
    );

    let progress = UploadProgress::from_article(&article);
    if json_mode {
        let mut output = progress_json(&progress);
        output["article"] = serde_json::json!(article.title);
        output["started_at"] = serde_json::json!(started.name());
        output["item"] = serde_json::json!(article.id().map(|id| id.as_str()));
        output["page_id"] = serde_json::json!(article.page_id().map(|p| p.value()));
        print_json(&output);
        return Ok(());
    }

    println!("Upload: {} -> {}", started.name(), stage.name());
    println!();
    print_progress(&article, &progress);
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show stage and record-level progress of a saved article graph.
pub fn cmd_status(
    json_mode: bool,
    article_path: &Path,
    vocabulary: Option<&Path>,
) -> Result<(), SyncError> {
    let article_path = validate_file_path(article_path)?;
    let article = load(&article_path)?;
    let progress = UploadProgress::from_article(&article);

    // The chain is only complete once the stage reaches AnnotationsUploaded.
    let chain = match vocabulary {
        Some(path) if article.stage() >= Stage::AnnotationsUploaded => {
            let vocabulary = load_vocabulary(path)?;
            let terminus = vocabulary.item(TERMINUS_LABEL)?;
            Some(verify_chain(&article, terminus).map_err(|e| e.to_string()))
        }
        _ => None,
    };

    if json_mode {
        let mut output = progress_json(&progress);
        output["article"] = serde_json::json!(article.title);
        output["chain_verified"] = match &chain {
            Some(Ok(())) => serde_json::json!(true),
            Some(Err(reason)) => serde_json::json!(reason),
            None => serde_json::Value::Null,
        };
        print_json(&output);
        return Ok(());
    }

    println!("ScienceSource Article Status");
    println!("============================");
    print_progress(&article, &progress);
    match chain {
        Some(Ok(())) => println!("Chain:        verified"),
        Some(Err(reason)) => println!("Chain:        BROKEN - {}", reason),
        None => {}
    }
    Ok(())
}

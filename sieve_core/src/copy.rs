use std::collections::HashSet;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;
use tempfile::NamedTempFile;

use crate::SieveError;
use crate::SieveResult;
use crate::chain::FilterPlan;
use crate::config::CopyConfig;
use crate::stream::ReaderSource;

/// Options controlling which files [`copy_tree`] visits.
#[derive(Debug, Clone)]
pub struct CopyOptions {
	/// Gitignore-style patterns for files and directories to skip.
	pub exclude_patterns: Vec<String>,
	/// When non-empty, only files matching one of these globs (relative to
	/// the source root) are copied.
	pub include_set: GlobSet,
	/// Whether to ignore the source root's `.gitignore`.
	pub disable_gitignore: bool,
}

impl Default for CopyOptions {
	fn default() -> Self {
		Self {
			exclude_patterns: Vec::new(),
			include_set: GlobSet::empty(),
			disable_gitignore: false,
		}
	}
}

impl CopyOptions {
	/// Construct [`CopyOptions`] from the `[copy]` section of a config.
	pub fn from_config(config: Option<&CopyConfig>) -> SieveResult<Self> {
		let Some(config) = config else {
			return Ok(Self::default());
		};

		Ok(Self {
			exclude_patterns: config.exclude.clone(),
			include_set: build_glob_set(&config.include)?,
			disable_gitignore: config.disable_gitignore,
		})
	}
}

/// A single file written by [`copy_tree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedFile {
	pub source: PathBuf,
	pub destination: PathBuf,
	/// Characters written to the destination after filtering.
	pub chars_written: u64,
}

/// Result of copying a directory tree.
#[derive(Debug, Default)]
pub struct CopyReport {
	pub files: Vec<CopiedFile>,
}

impl CopyReport {
	pub fn file_count(&self) -> usize {
		self.files.len()
	}

	pub fn chars_written(&self) -> u64 {
		self.files.iter().map(|file| file.chars_written).sum()
	}
}

/// Pull every character out of a chain built over `reader` and write it to
/// `writer`. Returns the number of characters written.
///
/// Read failures and invalid UTF-8 in the input are reported after the chain
/// has been drained; whatever was decoded before the failure has already
/// been written.
pub fn filter_to_writer<R: BufRead, W: Write>(
	reader: R,
	writer: W,
	plan: &FilterPlan,
) -> SieveResult<u64> {
	let mut source = ReaderSource::new(reader);
	let mut writer = BufWriter::new(writer);
	let mut written = 0;
	let mut encoded = [0u8; 4];

	for ch in plan.apply(&mut source) {
		writer.write_all(ch.encode_utf8(&mut encoded).as_bytes())?;
		written += 1;
	}

	writer.flush()?;

	if let Some(error) = source.take_error() {
		return Err(error);
	}

	tracing::trace!(bytes_read = source.bytes_read(), chars_written = written, "drained chain");
	Ok(written)
}

/// Copy a single file through the filter plan, creating parent directories
/// of `destination` as needed.
///
/// The output is staged in a temporary file next to `destination` and only
/// moved into place once the whole source has been filtered, so a failed
/// copy leaves an existing destination untouched and creates no new one.
pub fn copy_file(source: &Path, destination: &Path, plan: &FilterPlan) -> SieveResult<u64> {
	if destination.exists() && same_file(source, destination) {
		return Err(SieveError::SameFile {
			path: source.display().to_string(),
		});
	}

	let parent = match destination.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};
	std::fs::create_dir_all(parent)?;

	let reader = BufReader::new(File::open(source)?);
	let mut staging = NamedTempFile::new_in(parent)?;
	let written = filter_to_writer(reader, staging.as_file_mut(), plan)?;

	// Temp files are created owner-only; carry the source's mode instead.
	std::fs::set_permissions(staging.path(), std::fs::metadata(source)?.permissions())?;
	staging.persist(destination).map_err(|e| e.error)?;

	tracing::debug!(
		source = %source.display(),
		destination = %destination.display(),
		chars = written,
		"copied file"
	);

	Ok(written)
}

/// Copy every eligible file below `source_root` into `destination_root`,
/// preserving relative paths and filtering each file through its own chain.
pub fn copy_tree(
	source_root: &Path,
	destination_root: &Path,
	plan: &FilterPlan,
	options: &CopyOptions,
) -> SieveResult<CopyReport> {
	let files = collect_files(source_root, destination_root, options)?;
	let mut report = CopyReport::default();

	for source in files {
		let Ok(relative) = source.strip_prefix(source_root) else {
			continue;
		};

		if !options.include_set.is_empty() && !options.include_set.is_match(relative) {
			continue;
		}

		let destination = destination_root.join(relative);
		let chars_written = copy_file(&source, &destination, plan)?;
		report.files.push(CopiedFile {
			source,
			destination,
			chars_written,
		});
	}

	tracing::debug!(files = report.file_count(), "copied tree");
	Ok(report)
}

fn same_file(left: &Path, right: &Path) -> bool {
	match (left.canonicalize(), right.canonicalize()) {
		(Ok(left), Ok(right)) => left == right,
		_ => false,
	}
}

/// Build a `GlobSet` from a list of glob pattern strings.
fn build_glob_set(patterns: &[String]) -> SieveResult<GlobSet> {
	let mut builder = GlobSetBuilder::new();
	for pattern in patterns {
		let glob = Glob::new(pattern).map_err(|e| {
			SieveError::ConfigParse(format!("invalid include pattern `{pattern}`: {e}"))
		})?;
		builder.add(glob);
	}
	builder
		.build()
		.map_err(|e| SieveError::ConfigParse(format!("failed to build include rules: {e}")))
}

/// Build a `Gitignore` matcher from `[copy] exclude` patterns.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> SieveResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			SieveError::ConfigParse(format!("invalid exclude pattern `{pattern}`: {e}"))
		})?;
	}
	builder
		.build()
		.map_err(|e| SieveError::ConfigParse(format!("failed to build exclude rules: {e}")))
}

/// Build a `Gitignore` matcher from the source root's `.gitignore` (if any).
fn build_gitignore(root: &Path) -> Gitignore {
	let mut builder = GitignoreBuilder::new(root);
	let gitignore_path = root.join(".gitignore");
	if gitignore_path.exists() {
		let _ = builder.add(gitignore_path);
	}
	builder.build().unwrap_or_else(|_| Gitignore::empty())
}

/// Collect all regular files below `root` in a deterministic order.
fn collect_files(
	root: &Path,
	destination_root: &Path,
	options: &CopyOptions,
) -> SieveResult<Vec<PathBuf>> {
	let gitignore = if options.disable_gitignore {
		Gitignore::empty()
	} else {
		build_gitignore(root)
	};
	let custom_exclude = build_exclude_matcher(root, &options.exclude_patterns)?;
	let walker = Walker {
		gitignore: &gitignore,
		custom_exclude: &custom_exclude,
		// Copying into a directory below the source must not pick up its own
		// output.
		skip_dir: destination_root.canonicalize().ok(),
	};

	let mut files = Vec::new();
	let mut visited_dirs = HashSet::new();
	walker.walk(root, &mut files, &mut visited_dirs)?;
	files.sort();
	Ok(files)
}

struct Walker<'a> {
	gitignore: &'a Gitignore,
	custom_exclude: &'a Gitignore,
	skip_dir: Option<PathBuf>,
}

impl Walker<'_> {
	fn walk(
		&self,
		dir: &Path,
		files: &mut Vec<PathBuf>,
		visited_dirs: &mut HashSet<PathBuf>,
	) -> SieveResult<()> {
		if !dir.is_dir() {
			return Ok(());
		}

		// Detect symlink cycles by tracking canonical paths.
		let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
		if self.skip_dir.as_ref() == Some(&canonical) {
			return Ok(());
		}
		if !visited_dirs.insert(canonical) {
			return Err(SieveError::SymlinkCycle {
				path: dir.display().to_string(),
			});
		}

		for entry in std::fs::read_dir(dir)? {
			let path = entry?.path();

			if path.file_name().is_some_and(|name| name == ".git") {
				continue;
			}

			let is_dir = path.is_dir();

			if self.gitignore.matched(&path, is_dir).is_ignore() {
				continue;
			}

			if self.custom_exclude.matched(&path, is_dir).is_ignore() {
				continue;
			}

			if is_dir {
				self.walk(&path, files, visited_dirs)?;
			} else if path.is_file() {
				files.push(path);
			}
		}

		Ok(())
	}
}

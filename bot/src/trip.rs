//! Exported trip archives: loading, weighted selection and step context.
//!
//! Each configured trip points at one already exported `trip.json` file.
//! Only the fields the bot needs are read. Step media are referenced by path
//! from the step folders next to `trip.json`; their bytes stay on disk.
//!
//! Expected export layout:
//!
//! ```text
//! user_data/
//!   user/user.json            { "username": ... }
//!   trip/<name>_<trip id>/
//!     trip.json
//!     <slug>_<step id>/photos/*.jpg
//!     <slug>_<step id>/videos/*.mp4
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Steps on each side of the selected step included as background.
pub const NEARBY_WINDOW: usize = 3;

/// One configured trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TripConfig {
    pub trip_id: String,
    /// Appended to step links so private albums stay viewable.
    #[serde(default)]
    pub album_secret: String,
    /// Path to the exported `trip.json`, relative to the config file.
    pub archive: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TripData {
    pub id: u64,
    pub name: String,
    pub slug: String,
    /// Account that owns the trip; empty when the export does not say.
    pub username: String,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub id: u64,
    pub slug: String,
    pub start_time: DateTime<Utc>,
    pub location: Location,
    pub name: String,
    pub description: String,
    pub weather_condition: Option<String>,
    pub weather_temperature: Option<f64>,
    pub media: Vec<Media>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
}

/// One photo or video file belonging to a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub kind: MediaKind,
    pub path: PathBuf,
}

impl Media {
    /// `.jpg` files are photos, everything else is video.
    pub fn from_path(path: PathBuf) -> Self {
        let is_photo = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"));
        let kind = if is_photo {
            MediaKind::Photo
        } else {
            MediaKind::Video
        };
        Self { kind, path }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub locality: String,
    pub full_detail: String,
}

#[derive(Debug, Deserialize)]
struct RawTrip {
    id: u64,
    name: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    user: Option<RawUser>,
    #[serde(default)]
    all_steps: Vec<RawStep>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    #[serde(default)]
    username: String,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    id: u64,
    #[serde(default)]
    slug: String,
    /// Seconds since the Unix epoch.
    start_time: f64,
    location: RawLocation,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    weather_condition: Option<String>,
    #[serde(default)]
    weather_temperature: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawLocation {
    #[serde(default)]
    name: String,
    #[serde(default)]
    full_detail: String,
}

impl TryFrom<RawStep> for Step {
    type Error = anyhow::Error;

    fn try_from(raw: RawStep) -> Result<Self> {
        let secs = raw.start_time.floor();
        let nanos = ((raw.start_time - secs) * 1e9) as u32;
        let start_time = DateTime::from_timestamp(secs as i64, nanos)
            .ok_or_else(|| anyhow!("step {} has invalid start_time {}", raw.id, raw.start_time))?;
        Ok(Self {
            id: raw.id,
            slug: raw.slug,
            start_time,
            location: Location {
                locality: raw.location.name,
                full_detail: raw.location.full_detail,
            },
            name: raw.name,
            description: raw.description.unwrap_or_default(),
            weather_condition: raw.weather_condition.filter(|c| !c.trim().is_empty()),
            weather_temperature: raw.weather_temperature,
            media: Vec::new(),
        })
    }
}

/// Parse an exported trip document. Media are attached by [`load_archive`].
pub fn parse_trip(contents: &str) -> Result<TripData> {
    let raw: RawTrip = serde_json::from_str(contents).context("parse trip json")?;
    let steps = raw
        .all_steps
        .into_iter()
        .map(Step::try_from)
        .collect::<Result<Vec<_>>>()?;
    Ok(TripData {
        id: raw.id,
        name: raw.name,
        slug: raw.slug,
        username: raw.user.map(|user| user.username).unwrap_or_default(),
        steps,
    })
}

/// Load the archive a trip config points at.
pub fn load_archive(trip: &TripConfig) -> Result<TripData> {
    load_archive_file(&trip.archive).with_context(|| format!("load trip {}", trip.trip_id))
}

fn load_archive_file(path: &Path) -> Result<TripData> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let mut data = parse_trip(&contents)?;
    if let Some(trip_dir) = path.parent() {
        if data.username.is_empty() {
            data.username = exported_username(trip_dir);
        }
        for step in &mut data.steps {
            step.media = step_media(trip_dir, step.id);
        }
    }
    debug!(path = %path.display(), steps = data.steps.len(), "trip archive loaded");
    Ok(data)
}

/// Username from `user/user.json` two levels above the trip folder.
fn exported_username(trip_dir: &Path) -> String {
    let Some(root) = trip_dir.parent().and_then(Path::parent) else {
        return String::new();
    };
    let path = root.join("user").join("user.json");
    let Ok(contents) = fs::read_to_string(&path) else {
        return String::new();
    };
    match serde_json::from_str::<RawUser>(&contents) {
        Ok(user) => user.username,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "unreadable user export");
            String::new()
        }
    }
}

/// Every file under the step folder of `step_id`, sorted by path.
///
/// A step without a folder has no media.
fn step_media(trip_dir: &Path, step_id: u64) -> Vec<Media> {
    let Ok(entries) = fs::read_dir(trip_dir) else {
        return Vec::new();
    };
    let Some(step_dir) = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .find(|path| path.is_dir() && names_step(path, step_id))
    else {
        return Vec::new();
    };
    WalkDir::new(step_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| Media::from_path(entry.into_path()))
        .collect()
}

/// Step folders are named `<slug>_<id>` or just `<id>`.
fn names_step(dir: &Path, step_id: u64) -> bool {
    let Some(name) = dir.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    let id = step_id.to_string();
    name == id || name.ends_with(&format!("_{id}"))
}

/// Choose a trip: `selector` wins, otherwise weighted by step count.
///
/// Trips without steps are never picked at random.
pub fn select_trip<R: Rng + ?Sized>(
    trips: &[TripData],
    selector: Option<usize>,
    rng: &mut R,
) -> Result<usize> {
    if trips.is_empty() {
        bail!("no trips configured");
    }
    if let Some(index) = selector {
        if index >= trips.len() {
            bail!("trip index {index} out of range (0..{})", trips.len());
        }
        return Ok(index);
    }
    let weights = WeightedIndex::new(trips.iter().map(|trip| trip.steps.len()))
        .context("no configured trip has any steps")?;
    Ok(weights.sample(rng))
}

/// Choose a uniformly random step of `trip`.
pub fn select_step<R: Rng + ?Sized>(trip: &TripData, rng: &mut R) -> Result<usize> {
    if trip.steps.is_empty() {
        bail!("trip {} has no steps", trip.name);
    }
    Ok(rng.gen_range(0..trip.steps.len()))
}

/// Steps within [`NEARBY_WINDOW`] before `index`, `index` itself, and up to
/// two after it.
pub fn nearby_steps(steps: &[Step], index: usize) -> &[Step] {
    let start = index.saturating_sub(NEARBY_WINDOW).min(steps.len());
    let end = index.saturating_add(NEARBY_WINDOW).min(steps.len());
    &steps[start..end.max(start)]
}

/// Background text for the domain answer task, one block per step.
pub fn background_text(steps: &[Step]) -> String {
    steps
        .iter()
        .enumerate()
        .map(|(idx, step)| {
            format!(
                "Step {}: {} ({})\n{}",
                idx + 1,
                step.name,
                step.start_time.to_rfc3339_opts(SecondsFormat::Millis, true),
                step.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The journal message for `step`: trip, linked step name, day, place,
/// weather, media counts and description.
pub fn step_message(
    config: &TripConfig,
    username: &str,
    trip: &TripData,
    step: &Step,
    first: &Step,
) -> String {
    let link = format!(
        "https://www.polarsteps.com/{username}/{}-{}/{}-{}{}",
        trip.id, trip.slug, step.id, step.slug, config.album_secret
    );
    let day_number = (step.start_time - first.start_time).num_days() + 1;
    let weather = match (&step.weather_condition, step.weather_temperature) {
        (Some(condition), Some(temperature)) => Some(format!(
            "🌤 {} | {temperature}°C",
            condition.replace('-', " ")
        )),
        _ => None,
    };
    let photos = count_media(&step.media, MediaKind::Photo);
    let videos = count_media(&step.media, MediaKind::Video);
    let media = format!(
        "🖼 {photos} {} | 🎥 {videos} {}",
        plural(photos, "photo"),
        plural(videos, "video")
    );

    [
        Some(format!("🗺️ {}", trip.name)),
        Some(format!("📍 [{}]({link})", step.name)),
        Some(" ".to_string()),
        Some(format!(
            "🗓 Day {day_number}, {}",
            step.start_time.format("%B %-d, %Y")
        )),
        Some(format!(
            "🌍 {}, {}",
            step.location.locality, step.location.full_detail
        )),
        weather,
        Some(media),
        Some(" ".to_string()),
        Some(step.description.trim().to_string()),
    ]
    .into_iter()
    .flatten()
    .filter(|line| !line.is_empty())
    .collect::<Vec<_>>()
    .join("\n")
}

fn count_media(media: &[Media], kind: MediaKind) -> usize {
    media.iter().filter(|item| item.kind == kind).count()
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        noun.to_string()
    } else {
        format!("{noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const TRIP_JSON: &str = r#"{
        "id": 1234,
        "name": "Benelux by bike",
        "slug": "benelux",
        "user": { "username": "traveller" },
        "all_steps": [
            {
                "id": 1, "slug": "brussels", "start_time": 1714557600.0,
                "location": { "name": "Brussels", "full_detail": "Belgium" },
                "timezone_id": "Europe/Brussels", "name": "Brussels",
                "description": "Waffles.", "weather_condition": "partly-cloudy",
                "weather_temperature": 17
            },
            {
                "id": 2, "slug": "ghent", "start_time": 1714730400.5,
                "location": { "name": "Ghent", "full_detail": "Belgium" },
                "timezone_id": "Europe/Brussels", "name": "Ghent",
                "description": null
            }
        ]
    }"#;

    fn trip_config() -> TripConfig {
        TripConfig {
            trip_id: "1234".to_string(),
            album_secret: "?s=abc".to_string(),
            archive: PathBuf::from("trip.json"),
        }
    }

    fn trip_with_steps(name: &str, count: usize) -> TripData {
        let step = parse_trip(TRIP_JSON).expect("parse").steps[0].clone();
        TripData {
            id: 1,
            name: name.to_string(),
            slug: name.to_string(),
            username: "traveller".to_string(),
            steps: vec![step; count],
        }
    }

    fn media(kinds: &[MediaKind]) -> Vec<Media> {
        kinds
            .iter()
            .enumerate()
            .map(|(idx, kind)| Media {
                kind: *kind,
                path: PathBuf::from(format!("m{idx}")),
            })
            .collect()
    }

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, contents).expect("write");
    }

    #[test]
    fn parses_exported_trip() {
        let trip = parse_trip(TRIP_JSON).expect("parse");
        assert_eq!(trip.username, "traveller");
        assert_eq!(trip.steps.len(), 2);
        let first = &trip.steps[0];
        assert_eq!(first.location.locality, "Brussels");
        assert_eq!(
            first.start_time.to_rfc3339_opts(SecondsFormat::Secs, true),
            "2024-05-01T10:00:00Z"
        );
        assert_eq!(first.weather_temperature, Some(17.0));
        assert!(first.media.is_empty());
        assert_eq!(trip.steps[1].description, "");
        assert_eq!(trip.steps[1].weather_condition, None);
    }

    #[test]
    fn load_archive_names_trip_on_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut config = trip_config();
        config.archive = temp.path().join("missing.json");
        let err = load_archive(&config).unwrap_err();
        assert!(format!("{err:#}").contains("load trip 1234"));

        let path = temp.path().join("trip.json");
        fs::write(&path, TRIP_JSON).expect("write");
        config.archive = path;
        assert_eq!(load_archive(&config).expect("load").name, "Benelux by bike");
    }

    #[test]
    fn load_archive_attaches_step_media_and_exported_username() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path().join("user_data");
        let trip_dir = root.join("trip").join("benelux_1234");
        let without_user = TRIP_JSON.replace(r#""user": { "username": "traveller" },"#, "");
        write(&trip_dir.join("trip.json"), &without_user);
        write(&root.join("user").join("user.json"), r#"{"username": "exported", "id": 9}"#);
        write(&trip_dir.join("brussels_1").join("photos").join("b.jpg"), "b");
        write(&trip_dir.join("brussels_1").join("photos").join("a.JPG"), "a");
        write(&trip_dir.join("brussels_1").join("videos").join("c.mp4"), "c");
        write(&trip_dir.join("leuven_11").join("photos").join("x.jpg"), "x");

        let mut config = trip_config();
        config.archive = trip_dir.join("trip.json");
        let trip = load_archive(&config).expect("load");

        assert_eq!(trip.username, "exported");
        let brussels = &trip.steps[0].media;
        let names: Vec<&str> = brussels
            .iter()
            .filter_map(|item| item.path.file_name().and_then(|name| name.to_str()))
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.jpg", "c.mp4"]);
        let kinds: Vec<MediaKind> = brussels.iter().map(|item| item.kind).collect();
        assert_eq!(kinds, vec![MediaKind::Photo, MediaKind::Photo, MediaKind::Video]);
        assert!(trip.steps[1].media.is_empty());
    }

    #[test]
    fn step_folder_must_match_the_whole_id() {
        assert!(names_step(Path::new("brussels_1"), 1));
        assert!(names_step(Path::new("1"), 1));
        assert!(!names_step(Path::new("leuven_11"), 1));
        assert!(!names_step(Path::new("brussels_1x"), 1));
    }

    #[test]
    fn explicit_selector_wins() {
        let trips = vec![trip_with_steps("a", 0), trip_with_steps("b", 3)];
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(select_trip(&trips, Some(0), &mut rng).expect("select"), 0);
        assert!(select_trip(&trips, Some(2), &mut rng).is_err());
    }

    #[test]
    fn weighted_selection_skips_empty_trips() {
        let trips = vec![trip_with_steps("a", 0), trip_with_steps("b", 3)];
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(select_trip(&trips, None, &mut rng).expect("select"), 1);
        }
    }

    #[test]
    fn all_empty_trips_is_an_error() {
        let trips = vec![trip_with_steps("a", 0)];
        let mut rng = StdRng::seed_from_u64(7);
        assert!(select_trip(&trips, None, &mut rng).is_err());
        assert!(select_trip(&[], None, &mut rng).is_err());
        assert!(select_step(&trips[0], &mut rng).is_err());
    }

    #[test]
    fn nearby_steps_window() {
        let steps = trip_with_steps("a", 10).steps;
        assert_eq!(nearby_steps(&steps, 0).len(), 3);
        assert_eq!(nearby_steps(&steps, 5).len(), 6);
        assert_eq!(nearby_steps(&steps, 9).len(), 4);
        assert!(nearby_steps(&[], 0).is_empty());
    }

    #[test]
    fn background_lists_numbered_steps() {
        let trip = parse_trip(TRIP_JSON).expect("parse");
        assert_eq!(
            background_text(&trip.steps),
            "Step 1: Brussels (2024-05-01T10:00:00.000Z)\nWaffles.\n\n\
             Step 2: Ghent (2024-05-03T10:00:00.500Z)\n"
        );
    }

    #[test]
    fn step_message_renders_journal_entry() {
        let trip = parse_trip(TRIP_JSON).expect("parse");
        let message = step_message(&trip_config(), "traveller", &trip, &trip.steps[0], &trip.steps[0]);
        assert_eq!(
            message,
            "🗺️ Benelux by bike\n\
             📍 [Brussels](https://www.polarsteps.com/traveller/1234-benelux/1-brussels?s=abc)\n \n\
             🗓 Day 1, May 1, 2024\n\
             🌍 Brussels, Belgium\n\
             🌤 partly cloudy | 17°C\n\
             🖼 0 photos | 🎥 0 videos\n \n\
             Waffles."
        );

        let later = step_message(&trip_config(), "traveller", &trip, &trip.steps[1], &trip.steps[0]);
        assert!(later.contains("🗓 Day 3, May 3, 2024"));
        assert!(!later.contains("🌤"));
        assert!(later.ends_with("🌍 Ghent, Belgium\n🖼 0 photos | 🎥 0 videos\n "));
    }

    #[test]
    fn step_message_pluralises_media_counts() {
        let trip = parse_trip(TRIP_JSON).expect("parse");
        let mut step = trip.steps[0].clone();
        let summary = |step: &Step| {
            step_message(&trip_config(), "traveller", &trip, step, &trip.steps[0])
                .lines()
                .find(|line| line.starts_with("🖼"))
                .map(str::to_string)
                .expect("media line")
        };

        step.media = media(&[MediaKind::Photo, MediaKind::Video]);
        assert_eq!(summary(&step), "🖼 1 photo | 🎥 1 video");

        step.media = media(&[
            MediaKind::Photo,
            MediaKind::Photo,
            MediaKind::Photo,
            MediaKind::Video,
            MediaKind::Video,
        ]);
        assert_eq!(summary(&step), "🖼 3 photos | 🎥 2 videos");
    }
}

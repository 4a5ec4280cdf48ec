use std::path::PathBuf;

use chrono::Local;

use crate::pipeline::GenreMap;

/// Writes the run report to a timestamped text file in the working
/// directory and returns its path.
///
/// The report lists totals, the playlists created and updated, and the
/// per-genre track distribution (largest genres first). Callers treat a
/// write failure as a warning; the run itself has already succeeded.
pub async fn write_report(
    genres: &GenreMap,
    created: &[String],
    updated: &[String],
) -> Result<PathBuf, String> {
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let path = PathBuf::from(format!("sporgcli_genre_report_{}.txt", timestamp));

    let mut report = format!(
        "=== Spotify Genre Organizer Report ===\n\
         Timestamp: {}\n\
         Total genres processed: {}\n\
         Total playlists created: {}\n\
         Total playlists updated: {}\n\n\
         Playlists Created:\n",
        timestamp.replace('_', " "),
        genres.len(),
        created.len(),
        updated.len()
    );

    for playlist in created {
        report.push_str(&format!(" - {}\n", playlist));
    }

    report.push_str("\nPlaylists Updated:\n");
    for playlist in updated {
        report.push_str(&format!(" - {}\n", playlist));
    }

    report.push_str("\nGenre Distribution:\n");
    let mut distribution: Vec<(&String, usize)> =
        genres.iter().map(|(genre, tracks)| (genre, tracks.len())).collect();
    distribution.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    for (genre, count) in distribution {
        report.push_str(&format!(" - {}: {} tracks\n", genre, count));
    }

    async_fs::write(&path, report)
        .await
        .map_err(|e| e.to_string())?;

    Ok(path)
}

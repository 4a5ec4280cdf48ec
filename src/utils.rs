use rand::{Rng, distr::Alphanumeric};

/// Generates the random `state` nonce for the OAuth authorization request.
pub fn generate_state_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Title-cases a genre tag for display and playlist naming, e.g.
/// `"progressive rock"` -> `"Progressive Rock"`.
pub fn title_case(genre: &str) -> String {
    genre
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds the playlist name used for a genre.
pub fn playlist_name_for_genre(genre: &str) -> String {
    format!("Genre: {}", title_case(genre))
}

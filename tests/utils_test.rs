use sporgcli::utils::*;

#[test]
fn test_generate_state_token() {
    let token = generate_state_token();

    // Should be exactly 32 characters
    assert_eq!(token.len(), 32);

    // Should contain only alphanumeric characters
    assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));

    // Two generated tokens should be different
    let token2 = generate_state_token();
    assert_ne!(token, token2);
}

#[test]
fn test_title_case() {
    assert_eq!(title_case("rock"), "Rock");
    assert_eq!(title_case("progressive rock"), "Progressive Rock");
    assert_eq!(title_case("hip hop"), "Hip Hop");
    assert_eq!(title_case(""), "");

    // extra whitespace collapses
    assert_eq!(title_case("  indie   pop "), "Indie Pop");
}

#[test]
fn test_playlist_name_for_genre() {
    assert_eq!(playlist_name_for_genre("jazz"), "Genre: Jazz");
    assert_eq!(playlist_name_for_genre("death metal"), "Genre: Death Metal");
}

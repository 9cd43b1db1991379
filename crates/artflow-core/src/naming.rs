//! Output filename derivation.
//!
//! Two policies: prompt-derived (sanitized slug plus a fresh unique suffix,
//! so repeated prompts never collide) and sequence-derived (`pic_<n>`,
//! deterministic, matching the job's position in the queue). The `.png`
//! extension is appended by the download step, not here.

use uuid::Uuid;

const MAX_SLUG_LEN: usize = 50;

/// Sanitized slug of a prompt: only `[A-Za-z0-9_]`, at most 50 characters.
pub fn prompt_slug(prompt: &str) -> String {
    let slug: String = prompt
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == ',')
        .map(|c| if c.is_whitespace() || c == ',' { '_' } else { c })
        .take(MAX_SLUG_LEN)
        .collect();
    slug.trim_end_matches(['.', ' ']).to_string()
}

/// Prompt-derived name: slug plus a freshly generated unique suffix.
pub fn prompt_name(prompt: &str) -> String {
    format!("{}{}", prompt_slug(prompt), Uuid::new_v4())
}

/// Sequence-derived name: `pic_<sequence>`, or `pic_<sequence>_<i>_of_<k>`
/// when one job extracts several images.
pub fn sequence_name(sequence: u32, index: usize, count: usize) -> String {
    if count > 1 {
        format!("pic_{sequence}_{}_of_{count}", index + 1)
    } else {
        format!("pic_{sequence}")
    }
}

/// Pick the naming policy for one extracted image.
pub fn output_name(prompt: &str, sequence: Option<u32>, index: usize, count: usize) -> String {
    match sequence {
        Some(sequence) => sequence_name(sequence, index, count),
        None => prompt_name(prompt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_keeps_only_word_characters() {
        let slug = prompt_slug("a whale, breaching! (photo-real) @dawn");
        assert!(slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        assert_eq!(slug, "a_whale__breaching_photoreal_dawn");
    }

    #[test]
    fn slug_is_truncated_to_fifty() {
        let long = "word ".repeat(40);
        assert!(prompt_slug(&long).len() <= 50);
    }

    #[test]
    fn slug_of_spec_scenario_prompt() {
        assert_eq!(
            prompt_slug("a whale in a sunny day"),
            "a_whale_in_a_sunny_day"
        );
    }

    #[test]
    fn prompt_names_never_collide_for_same_text() {
        let a = prompt_name("a lion in a suit");
        let b = prompt_name("a lion in a suit");
        assert_ne!(a, b);
        assert!(a.starts_with("a_lion_in_a_suit"));
    }

    #[test]
    fn prompt_name_prefix_stays_capped() {
        let name = prompt_name(&"x".repeat(200));
        // Suffix is a UUID (36 chars); everything before it obeys the cap.
        assert!(name.len() <= MAX_SLUG_LEN + 36);
    }

    #[test]
    fn sequence_name_single_image() {
        assert_eq!(sequence_name(1, 0, 1), "pic_1");
        assert_eq!(sequence_name(7, 0, 1), "pic_7");
    }

    #[test]
    fn sequence_name_multi_image() {
        assert_eq!(sequence_name(3, 0, 4), "pic_3_1_of_4");
        assert_eq!(sequence_name(3, 3, 4), "pic_3_4_of_4");
    }

    #[test]
    fn output_name_prefers_sequence_when_present() {
        assert_eq!(output_name("ignored", Some(2), 0, 1), "pic_2");
        assert!(output_name("a whale", None, 0, 1).starts_with("a_whale"));
    }
}

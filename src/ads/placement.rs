//! In-article ad placement.
//!
//! Content is split into paragraphs; long enough articles get an ad rotator
//! after the paragraphs at one third and two thirds of the way through.

const PARAGRAPH_END: &str = "</p>";

/// Articles shorter than this are rendered untouched.
const MIN_PARAGRAPHS_FOR_ADS: usize = 4;

/// A piece of rendered article content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Html(String),
    /// Slot for an in-article ad rotator
    Ad,
}

/// Split `html` into paragraphs and interleave ad slots.
///
/// Ad slots follow paragraph `n / 3` and paragraph `2n / 3` (zero-based, `n`
/// non-empty paragraphs). Each paragraph is re-closed with exactly one
/// `</p>`. With fewer than four paragraphs, or nothing to show, the content
/// comes back as a single unmodified segment.
pub fn splice_ads(html: &str, has_ads: bool) -> Vec<Segment> {
    let chunks: Vec<&str> = html
        .split(PARAGRAPH_END)
        .filter(|chunk| !chunk.trim().is_empty())
        .collect();

    let n = chunks.len();
    if !has_ads || n < MIN_PARAGRAPHS_FOR_ADS {
        return vec![Segment::Html(html.to_string())];
    }

    let first = n / 3;
    let second = 2 * n / 3;

    let mut segments = Vec::with_capacity(n + 2);
    for (i, chunk) in chunks.into_iter().enumerate() {
        segments.push(Segment::Html(format!("{}{}", chunk, PARAGRAPH_END)));
        if i == first || i == second {
            segments.push(Segment::Ad);
        }
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraphs(n: usize) -> String {
        (0..n).map(|i| format!("<p>Paragraph {}</p>\n", i)).collect()
    }

    fn ad_positions(segments: &[Segment]) -> Vec<usize> {
        // Paragraph index each ad follows.
        let mut positions = Vec::new();
        let mut paragraph = 0usize;
        for segment in segments {
            match segment {
                Segment::Html(_) => paragraph += 1,
                Segment::Ad => positions.push(paragraph - 1),
            }
        }
        positions
    }

    #[test]
    fn test_six_paragraphs_get_two_ads() {
        let segments = splice_ads(&paragraphs(6), true);
        assert_eq!(segments.iter().filter(|s| **s == Segment::Ad).count(), 2);
        assert_eq!(ad_positions(&segments), vec![2, 4]);
    }

    #[test]
    fn test_three_paragraphs_untouched() {
        let html = paragraphs(3);
        assert_eq!(splice_ads(&html, true), vec![Segment::Html(html.clone())]);
    }

    #[test]
    fn test_no_ads_untouched() {
        let html = paragraphs(9);
        assert_eq!(splice_ads(&html, false), vec![Segment::Html(html.clone())]);
    }

    #[test]
    fn test_four_and_five_paragraphs() {
        assert_eq!(ad_positions(&splice_ads(&paragraphs(4), true)), vec![1, 2]);
        assert_eq!(ad_positions(&splice_ads(&paragraphs(5), true)), vec![1, 3]);
    }

    #[test]
    fn test_empty_chunks_discarded_and_each_paragraph_closed_once() {
        let html = "<p>a</p><p>b</p>  </p><p>c</p>\n<p>d</p>\n";
        let segments = splice_ads(html, true);
        let rebuilt: String = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Html(h) => Some(h.as_str()),
                Segment::Ad => None,
            })
            .collect();
        assert_eq!(rebuilt.matches("</p>").count(), 4);
        assert_eq!(ad_positions(&segments), vec![1, 2]);
    }
}

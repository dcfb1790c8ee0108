use crate::page::WrappedTitle;

/// Width budget and text scale titles are laid out for.
#[derive(SmartDefault, PartialEq, Clone, Copy, Debug)]
pub struct TitleLayout {
    /// pixels
    #[default = 221.0]
    pub max_width: f32,
    #[default = 0.5]
    pub text_size_x: f32,
    #[default = 0.5]
    pub text_size_y: f32,
}

/// Layout collaborator that splits a title into display lines.
pub trait TitleWrapper: Send + Sync {
    fn wrap(&self, title: &str, layout: &TitleLayout) -> WrappedTitle;
}

/// Keeps every title on one line.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleLine;

impl TitleWrapper for SingleLine {
    fn wrap(&self, title: &str, _layout: &TitleLayout) -> WrappedTitle {
        vec![title.to_string()]
    }
}

/// Greedy word wrap for monospaced glyphs of `glyph_width` pixels at scale 1.0.
#[derive(SmartDefault, Clone, Copy, Debug)]
pub struct FixedWidthWrapper {
    #[default = 12.0]
    pub glyph_width: f32,
}

impl TitleWrapper for FixedWidthWrapper {
    fn wrap(&self, title: &str, layout: &TitleLayout) -> WrappedTitle {
        let glyph = self.glyph_width * layout.text_size_x;
        let per_line = if glyph > 0.0 {
            ((layout.max_width / glyph) as usize).max(1)
        } else {
            usize::MAX
        };

        let mut lines = Vec::new();
        let mut line = String::new();
        let mut line_len = 0;
        for word in title.split_whitespace() {
            let mut chars: Vec<char> = word.chars().collect();
            let needed = if line_len == 0 { chars.len() } else { chars.len() + 1 };
            if line_len + needed <= per_line {
                if line_len != 0 {
                    line.push(' ');
                }
                line.extend(chars.iter());
                line_len += needed;
                continue;
            }
            if line_len != 0 {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            // words longer than a line get hard-broken
            while chars.len() > per_line {
                let rest = chars.split_off(per_line);
                lines.push(chars.into_iter().collect());
                chars = rest;
            }
            line_len = chars.len();
            line = chars.into_iter().collect();
        }
        if line_len != 0 {
            lines.push(line);
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::{FixedWidthWrapper, SingleLine, TitleLayout, TitleWrapper};

    fn layout(max_width: f32) -> TitleLayout {
        TitleLayout {
            max_width,
            text_size_x: 1.0,
            text_size_y: 1.0,
        }
    }

    #[test]
    fn single_line_keeps_title() {
        assert_eq!(
            SingleLine.wrap("lofi hip hop radio", &TitleLayout::default()),
            vec!["lofi hip hop radio".to_string()]
        );
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let wrapper = FixedWidthWrapper { glyph_width: 10.0 };
        assert_eq!(
            wrapper.wrap("DECO*27 ghost rule feat", &layout(100.0)),
            vec!["DECO*27".to_string(), "ghost rule".to_string(), "feat".to_string()]
        );
    }

    #[test]
    fn breaks_long_words() {
        let wrapper = FixedWidthWrapper { glyph_width: 10.0 };
        assert_eq!(
            wrapper.wrap("abcdefgh ij", &layout(30.0)),
            vec![
                "abc".to_string(),
                "def".to_string(),
                "gh".to_string(),
                "ij".to_string()
            ]
        );
    }

    #[test]
    fn counts_characters_not_bytes() {
        let wrapper = FixedWidthWrapper { glyph_width: 10.0 };
        assert_eq!(
            wrapper.wrap("稲葉曇 ラグトレイン", &layout(60.0)),
            vec!["稲葉曇".to_string(), "ラグトレイン".to_string()]
        );
    }
}

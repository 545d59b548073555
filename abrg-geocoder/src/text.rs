//! Address text normalization
//!
//! Canonicalizes raw address text before any matching runs:
//! - full-width alphanumerics and symbols fold to ASCII
//! - kanji numerals fold to ASCII digits in numeric contexts (丁目/番/号)
//! - variant spellings fold to one representative (ヶ/が → ケ, 檜 → 桧),
//!   so a query and a table row matching in meaning match in characters
//! - the dash family folds to the [`DASH`] sentinel, the space family to
//!   [`SPACE`], so later stages treat "1-3", "1ー3" and "1 3" uniformly
//!
//! Every normalized character keeps the original text it replaced, so any
//! unmatched remainder reconstructs the input verbatim, separators included.
//! Normalization is idempotent: sentinels and already-folded characters map
//! to themselves.

/// Sentinel standing in for every dash-like separator. Private-use-area
/// codepoint, so it can never collide with address text.
pub const DASH: char = '\u{F8F0}';

/// Sentinel standing in for runs of whitespace.
pub const SPACE: char = '\u{F8F1}';

/// Dashes that always mean a separator, independent of context
const PLAIN_DASHES: &[char] = &['-', '‐', '‑', '‒', '–', '—', '―', '−'];

/// Characters that mean a separator only between digits
/// (ー is also the katakana long vowel mark, の/ノ/之 appear in names)
const CONTEXT_DASHES: &[char] = &['ー', 'ｰ', '〜', '~', 'の', 'ノ', '之'];

/// Fold variant spellings of the same place-name character to one
/// representative. Both table names and query text pass through this, so
/// 三ヶ日 and 三ケ日 match regardless of which form either side uses.
fn fold_variant(c: char) -> char {
    match c {
        'ヶ' | 'が' | 'ガ' => 'ケ',
        'ヵ' => 'カ',
        '檜' => '桧',
        '龍' => '竜',
        '嶋' => '島',
        '籠' => '篭',
        '濱' => '浜',
        '邊' | '邉' => '辺',
        '澤' => '沢',
        '櫻' => '桜',
        '壽' => '寿',
        '驒' => '騨',
        c => c,
    }
}

/// One normalized character with the original text it replaced.
///
/// When several original characters fold into one run of normalized output
/// (kanji numerals, collapsed spaces), the first normalized character of the
/// run carries the whole original text and the rest carry none.
#[derive(Debug, Clone)]
struct NChar {
    cur: char,
    org: String,
}

/// Normalized address text: the residual unmatched segments of a query.
///
/// Stages remove consumed prefixes with [`NormalizedText::take_prefix`];
/// what remains always reconstructs the corresponding original input via
/// [`NormalizedText::original`].
#[derive(Debug, Clone, Default)]
pub struct NormalizedText {
    chars: Vec<NChar>,
}

impl NormalizedText {
    /// Normalize raw address text.
    pub fn from_raw(raw: &str) -> Self {
        let mut chars: Vec<NChar> = Vec::with_capacity(raw.chars().count());

        // Pass 1: width folding and unambiguous character classes
        for c in raw.chars() {
            let cur = match c {
                // Full-width ASCII block folds by fixed offset
                '\u{FF01}'..='\u{FF5E}' => {
                    char::from_u32(c as u32 - 0xFEE0).unwrap_or(c)
                }
                ' ' | '\t' | '　' => SPACE,
                c if PLAIN_DASHES.contains(&c) => DASH,
                c => fold_variant(c),
            };
            chars.push(NChar { cur, org: c.to_string() });
        }

        // Pass 2: kanji numerals in numeric contexts
        chars = fold_kanji_numbers(chars);

        // Pass 3: context-dependent dashes (digit on both sides)
        for i in 0..chars.len() {
            if !CONTEXT_DASHES.contains(&chars[i].cur) {
                continue;
            }
            let prev_digit = i > 0 && chars[i - 1].cur.is_ascii_digit();
            let next_digit = chars
                .get(i + 1)
                .map(|n| n.cur.is_ascii_digit())
                .unwrap_or(false);
            if prev_digit && next_digit {
                chars[i].cur = DASH;
            }
        }

        // Pass 4: collapse runs of SPACE, keeping all original text
        let mut collapsed: Vec<NChar> = Vec::with_capacity(chars.len());
        for nc in chars {
            if nc.cur == SPACE {
                if let Some(last) = collapsed.last_mut() {
                    if last.cur == SPACE {
                        last.org.push_str(&nc.org);
                        continue;
                    }
                }
            }
            collapsed.push(nc);
        }

        Self { chars: collapsed }
    }

    /// Number of normalized characters remaining
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Normalized characters, for prefix matching
    pub fn as_chars(&self) -> Vec<char> {
        self.chars.iter().map(|c| c.cur).collect()
    }

    /// Normalized form as a string
    pub fn normalized(&self) -> String {
        self.chars.iter().map(|c| c.cur).collect()
    }

    /// Original text of the remaining segments, separators preserved
    pub fn original(&self) -> String {
        self.chars.iter().map(|c| c.org.as_str()).collect()
    }

    /// Remove the first `n` normalized characters, returning the original
    /// text they were derived from.
    pub fn take_prefix(&mut self, n: usize) -> String {
        let n = n.min(self.chars.len());
        self.chars.drain(..n).map(|c| c.org).collect()
    }
}

/// Kanji numeral digits and positional units
fn kanji_digit(c: char) -> Option<u64> {
    match c {
        '〇' => Some(0),
        '一' => Some(1),
        '二' => Some(2),
        '三' => Some(3),
        '四' => Some(4),
        '五' => Some(5),
        '六' => Some(6),
        '七' => Some(7),
        '八' => Some(8),
        '九' => Some(9),
        _ => None,
    }
}

fn kanji_unit(c: char) -> Option<u64> {
    match c {
        '十' => Some(10),
        '百' => Some(100),
        '千' => Some(1000),
        _ => None,
    }
}

fn is_kanji_number(c: char) -> bool {
    kanji_digit(c).is_some() || kanji_unit(c).is_some()
}

/// Evaluate a run of kanji numerals ("二十三" → 23, "一〇一" → 101)
fn kanji_number_value(run: &[char]) -> Option<u64> {
    let mut total: u64 = 0;
    let mut current: u64 = 0;
    let mut saw_digit = false;
    for &c in run {
        if let Some(d) = kanji_digit(c) {
            current = current.checked_mul(10)?.checked_add(d)?;
            saw_digit = true;
        } else if let Some(u) = kanji_unit(c) {
            let factor = if current == 0 { 1 } else { current };
            total = total.checked_add(factor.checked_mul(u)?)?;
            current = 0;
            saw_digit = true;
        } else {
            return None;
        }
    }
    if !saw_digit {
        return None;
    }
    Some(total + current)
}

/// Counter suffixes that mark a kanji-numeral run as a number
fn is_counter(c: char) -> bool {
    matches!(c, '丁' | '番' | '号' | '条')
}

/// Replace kanji-numeral runs followed by a counter with ASCII digits.
///
/// Only counter-adjacent runs convert; kanji numerals inside place names
/// (三田, 九段 without a counter) are left alone so name matching still
/// sees the table spelling.
fn fold_kanji_numbers(chars: Vec<NChar>) -> Vec<NChar> {
    let mut out: Vec<NChar> = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        if is_kanji_number(chars[i].cur) {
            let start = i;
            while i < chars.len() && is_kanji_number(chars[i].cur) {
                i += 1;
            }
            let followed_by_counter = chars.get(i).map(|n| is_counter(n.cur)).unwrap_or(false);
            let run: Vec<char> = chars[start..i].iter().map(|c| c.cur).collect();
            if followed_by_counter {
                if let Some(value) = kanji_number_value(&run) {
                    let org: String = chars[start..i].iter().map(|c| c.org.as_str()).collect();
                    let digits: Vec<char> = value.to_string().chars().collect();
                    for (k, d) in digits.iter().enumerate() {
                        out.push(NChar {
                            cur: *d,
                            org: if k == 0 { org.clone() } else { String::new() },
                        });
                    }
                    continue;
                }
            }
            out.extend(chars[start..i].iter().cloned());
        } else {
            out.push(chars[i].clone());
            i += 1;
        }
    }
    out
}

/// Normalize a reference-table name the same way query text is normalized.
///
/// Tables and input must agree on spelling for prefix matching to work, so
/// both sides run through [`NormalizedText`].
pub fn normalize_key(name: &str) -> Vec<char> {
    NormalizedText::from_raw(name).as_chars()
}

/// Prefix comparison with optional single-character wildcard.
///
/// Returns true when `hay` begins with `needle`; a `fuzzy` character in the
/// haystack matches any single needle character.
pub fn starts_with_fuzzy(hay: &[char], needle: &[char], fuzzy: Option<char>) -> bool {
    if hay.len() < needle.len() {
        return false;
    }
    hay.iter()
        .zip(needle.iter())
        .all(|(h, n)| h == n || Some(*h) == fuzzy)
}

/// Count of leading separator characters (SPACE, and optionally DASH) that
/// a stage may consume before its actual match.
pub fn leading_separators(chars: &[char], include_dash: bool) -> usize {
    chars
        .iter()
        .take_while(|&&c| c == SPACE || (include_dash && c == DASH))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_full_width_ascii() {
        let t = NormalizedText::from_raw("１２３ＡＢ");
        assert_eq!(t.normalized(), "123AB");
        assert_eq!(t.original(), "１２３ＡＢ");
    }

    #[test]
    fn folds_dashes_and_spaces_to_sentinels() {
        let t = NormalizedText::from_raw("1-3");
        assert_eq!(t.as_chars(), vec!['1', DASH, '3']);
        let t = NormalizedText::from_raw("1 3");
        assert_eq!(t.as_chars(), vec!['1', SPACE, '3']);
        let t = NormalizedText::from_raw("1ー3");
        assert_eq!(t.as_chars(), vec!['1', DASH, '3']);
        let t = NormalizedText::from_raw("1の3");
        assert_eq!(t.as_chars(), vec!['1', DASH, '3']);
    }

    #[test]
    fn long_vowel_mark_in_names_survives() {
        // ー between non-digits is not a separator
        let t = NormalizedText::from_raw("オーク");
        assert_eq!(t.normalized(), "オーク");
    }

    #[test]
    fn kanji_numbers_fold_before_counters() {
        assert_eq!(NormalizedText::from_raw("一丁目").normalized(), "1丁目");
        assert_eq!(NormalizedText::from_raw("二十三番").normalized(), "23番");
        assert_eq!(NormalizedText::from_raw("三号").normalized(), "3号");
    }

    #[test]
    fn kanji_numbers_in_names_are_preserved() {
        // 三田 is a place name, not "3田"
        assert_eq!(NormalizedText::from_raw("三田").normalized(), "三田");
        assert_eq!(NormalizedText::from_raw("九段南").normalized(), "九段南");
    }

    #[test]
    fn variant_spellings_unify_for_matching() {
        assert_eq!(NormalizedText::from_raw("三ヶ日").normalized(), "三ケ日");
        assert_eq!(NormalizedText::from_raw("三ケ日").normalized(), "三ケ日");
        assert_eq!(NormalizedText::from_raw("自由が丘").normalized(), "自由ケ丘");
        assert_eq!(NormalizedText::from_raw("檜原村").normalized(), "桧原村");
        // Output still carries what the caller typed
        assert_eq!(NormalizedText::from_raw("三ヶ日").original(), "三ヶ日");
    }

    #[test]
    fn kanji_number_values() {
        assert_eq!(kanji_number_value(&['二', '十', '三']), Some(23));
        assert_eq!(kanji_number_value(&['十']), Some(10));
        assert_eq!(kanji_number_value(&['一', '〇', '一']), Some(101));
        assert_eq!(kanji_number_value(&['千', '二', '百']), Some(1200));
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["東京都千代田区紀尾井町１ー３", "1-3 ビル", "一丁目二番三号"] {
            let once = NormalizedText::from_raw(raw).normalized();
            let twice = NormalizedText::from_raw(&once).normalized();
            assert_eq!(once, twice, "input {raw:?}");
        }
    }

    #[test]
    fn take_prefix_returns_original_text() {
        let mut t = NormalizedText::from_raw("１２-3残り");
        let taken = t.take_prefix(3); // "12" + DASH
        assert_eq!(taken, "１２-");
        assert_eq!(t.original(), "3残り");
    }

    #[test]
    fn consumed_plus_remainder_reconstructs_input() {
        let raw = "東京都　千代田区紀尾井町１ー３";
        let mut t = NormalizedText::from_raw(raw);
        let total = t.len();
        let head = t.take_prefix(4);
        assert_eq!(format!("{head}{}", t.original()), raw);
        assert_eq!(t.len(), total - 4);
    }

    #[test]
    fn space_runs_collapse_keeping_originals() {
        let mut t = NormalizedText::from_raw("a  　b");
        assert_eq!(t.as_chars(), vec!['a', SPACE, 'b']);
        assert_eq!(t.take_prefix(3), "a  　b");
    }

    #[test]
    fn fuzzy_prefix_comparison() {
        let hay: Vec<char> = "千代?区".chars().collect();
        let needle: Vec<char> = "千代田区".chars().collect();
        assert!(starts_with_fuzzy(&hay, &needle, Some('?')));
        assert!(!starts_with_fuzzy(&hay, &needle, None));
    }
}

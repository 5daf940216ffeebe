//! 文字符号集合の符号表。
//!
//! 各集合は94セルの行を並べた符号表で表現される。
//! 1バイト符号の集合は行0のみを持ち、2バイト符号の集合では
//! 1バイト目が行を、2バイト目がセルを選択する。

use std::slice;

mod data;

/// 94セルからなる符号表の1行。未割当のセルは`'\0'`とする。
pub type CharRow = [char; 94];

/// 行番号が連続する行のまとまり。
///
/// 行番号に欠落のある符号表を複数のまとまりで表現する。
/// 同じ[`CharMap`]内でまとまり同士の行番号が重複することはない。
#[derive(Debug, Clone, Copy)]
pub struct CharRows {
    /// 先頭の行番号（0起点）。
    pub first: u8,
    /// 行データ。
    pub rows: &'static [CharRow],
}

impl CharRows {
    /// 行`row`・セル`cell`の文字を取得する。
    ///
    /// 範囲外または未割当のセルでは`None`を返す。
    pub fn get(&self, row: u8, cell: u8) -> Option<char> {
        let row = self.rows.get((row as usize).checked_sub(self.first as usize)?)?;
        match *row.get(cell as usize)? {
            '\0' => None,
            c => Some(c),
        }
    }
}

/// 1つの文字符号集合を表す符号表。
#[derive(Debug, Clone, Copy)]
pub struct CharMap {
    /// 2バイト符号かどうか。
    pub two_byte: bool,
    /// 行のまとまり。空の場合は常に未対応として検索に失敗する。
    pub blocks: &'static [CharRows],
}

impl CharMap {
    /// 行`row`・セル`cell`の文字を取得する。未割当なら`None`を返す。
    pub fn decode(&self, row: u8, cell: u8) -> Option<char> {
        self.blocks.iter().find_map(|block| block.get(row, cell))
    }

    /// `c`が割り当てられた行・セルを検索する。
    pub fn find(&self, c: char) -> Option<(u8, u8)> {
        if c == '\0' {
            return None;
        }

        self.blocks.iter().find_map(|block| {
            block.rows.iter().enumerate().find_map(|(i, row)| {
                let cell = row.iter().position(|&rc| rc == c)?;
                Some((block.first + i as u8, cell as u8))
            })
        })
    }

    /// 符号表が空で、常に検索に失敗するかどうか。
    #[inline]
    pub fn is_unsupported(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// 英数集合。
pub static ALPHANUMERIC_MAP: CharMap = CharMap {
    two_byte: false,
    blocks: &[CharRows {
        first: 0,
        rows: slice::from_ref(&data::ALPHANUMERIC_ROW),
    }],
};

/// 平仮名集合。
pub static HIRAGANA_MAP: CharMap = CharMap {
    two_byte: false,
    blocks: &[CharRows {
        first: 0,
        rows: slice::from_ref(&data::HIRAGANA_ROW),
    }],
};

/// 片仮名集合。
pub static KATAKANA_MAP: CharMap = CharMap {
    two_byte: false,
    blocks: &[CharRows {
        first: 0,
        rows: slice::from_ref(&data::KATAKANA_ROW),
    }],
};

/// JIS X 0201片仮名集合。
pub static JIS_X0201_KATAKANA_MAP: CharMap = CharMap {
    two_byte: false,
    blocks: &[CharRows {
        first: 0,
        rows: slice::from_ref(&data::JIS_X0201_KATAKANA_ROW),
    }],
};

/// 標準漢字集合。
///
/// JIS X 0208の1区～86区に、90区～94区の追加記号を加えたもの。
// TODO: 90区～94区をARIB STD-B24 表7-11の追加記号で埋める。
pub static KANJI_STANDARD_MAP: CharMap = CharMap {
    two_byte: true,
    blocks: &[
        CharRows {
            first: 0,
            rows: &data::KANJI_BASE_ROWS,
        },
        CharRows {
            first: 89,
            rows: &data::SYMBOL_ROWS_90_94,
        },
    ],
};

/// 追加漢字集合。
///
/// JIS X 0208の1区～86区に、85区～89区の追加漢字を加えたもの。
pub static KANJI_ADDITIONAL_MAP: CharMap = CharMap {
    two_byte: true,
    blocks: &[
        CharRows {
            first: 0,
            rows: &data::KANJI_BASE_ROWS,
        },
        CharRows {
            first: 84,
            rows: &data::SYMBOL_ROWS_85_89,
        },
    ],
};

/// 未対応の1バイト集合。
pub static UNSUPPORTED_1BYTE: CharMap = CharMap {
    two_byte: false,
    blocks: &[],
};

/// 未対応の2バイト集合。
pub static UNSUPPORTED_2BYTE: CharMap = CharMap {
    two_byte: true,
    blocks: &[],
};

/// 指示可能な文字符号集合の名前。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GraphicSet {
    /// 英数、1バイト符号。
    Alnum,
    /// 平仮名、1バイト符号。
    Hira,
    /// 片仮名、1バイト符号。
    Kata,
    /// JIS X 0201片仮名、1バイト符号。
    JisXKata,
    /// 標準漢字、2バイト符号。
    KanjiStandard,
    /// 追加漢字、2バイト符号。
    KanjiAdditional,
    /// 未対応の1バイト符号集合。
    Unsupported1Byte,
    /// 未対応の2バイト符号集合。
    Unsupported2Byte,
    /// マクロ、1バイト符号。
    Macro,
}

impl GraphicSet {
    /// この集合の符号表を返す。
    ///
    /// マクロ集合は符号表を持たないため、未対応集合と同じ空の符号表を返す。
    pub fn char_map(self) -> &'static CharMap {
        match self {
            GraphicSet::Alnum => &ALPHANUMERIC_MAP,
            GraphicSet::Hira => &HIRAGANA_MAP,
            GraphicSet::Kata => &KATAKANA_MAP,
            GraphicSet::JisXKata => &JIS_X0201_KATAKANA_MAP,
            GraphicSet::KanjiStandard => &KANJI_STANDARD_MAP,
            GraphicSet::KanjiAdditional => &KANJI_ADDITIONAL_MAP,
            GraphicSet::Unsupported1Byte | GraphicSet::Macro => &UNSUPPORTED_1BYTE,
            GraphicSet::Unsupported2Byte => &UNSUPPORTED_2BYTE,
        }
    }

    /// この集合が2バイト符号かどうか。
    #[inline]
    pub fn is_two_byte(self) -> bool {
        self.char_map().two_byte
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_map_decode() {
        // 行0のみの1バイト集合
        assert_eq!(ALPHANUMERIC_MAP.decode(0, 0x41 - 0x21), Some('A'));
        assert_eq!(ALPHANUMERIC_MAP.decode(0, 0), Some('!'));
        assert_eq!(ALPHANUMERIC_MAP.decode(0, 93), Some('~'));
        assert_eq!(ALPHANUMERIC_MAP.decode(1, 0), None);
        assert_eq!(ALPHANUMERIC_MAP.decode(0, 94), None);

        assert_eq!(KATAKANA_MAP.decode(0, 0), Some('ァ'));
        assert_eq!(KATAKANA_MAP.decode(0, 1), Some('ア'));
        assert_eq!(HIRAGANA_MAP.decode(0, 1), Some('あ'));
        // 平仮名集合の未割当セル（0x74～0x76）
        assert_eq!(HIRAGANA_MAP.decode(0, 0x74 - 0x21), None);
        assert_eq!(JIS_X0201_KATAKANA_MAP.decode(0, 0x31 - 0x21), Some('ｱ'));
        assert_eq!(JIS_X0201_KATAKANA_MAP.decode(0, 0x60 - 0x21), None);

        // 2バイト集合：16区1点は「亜」、4区2点は「あ」
        assert_eq!(KANJI_STANDARD_MAP.decode(15, 0), Some('亜'));
        assert_eq!(KANJI_STANDARD_MAP.decode(3, 1), Some('あ'));
        // 9区～15区は未割当
        assert_eq!(KANJI_STANDARD_MAP.decode(8, 0), None);
        // 86区を超える行はどのまとまりでも未割当
        assert_eq!(KANJI_STANDARD_MAP.decode(89, 0), None);
        assert_eq!(KANJI_STANDARD_MAP.decode(94, 0), None);
    }

    #[test]
    fn test_char_map_find() {
        assert_eq!(ALPHANUMERIC_MAP.find('A'), Some((0, 0x41 - 0x21)));
        assert_eq!(ALPHANUMERIC_MAP.find('あ'), None);
        assert_eq!(ALPHANUMERIC_MAP.find('\0'), None);
        assert_eq!(KANJI_STANDARD_MAP.find('亜'), Some((15, 0)));
        assert_eq!(HIRAGANA_MAP.find('ん'), Some((0, 0x73 - 0x21)));

        // findとdecodeは互いに逆変換
        for c in ['!', '~', 'ぁ', 'ー', 'ヴ', '亜', '腕', '熙'] {
            let (row, cell) = KANJI_STANDARD_MAP
                .find(c)
                .or_else(|| HIRAGANA_MAP.find(c))
                .or_else(|| ALPHANUMERIC_MAP.find(c))
                .unwrap();
            let map = [&KANJI_STANDARD_MAP, &HIRAGANA_MAP, &ALPHANUMERIC_MAP]
                .into_iter()
                .find(|map| map.find(c).is_some())
                .unwrap();
            assert_eq!(map.decode(row, cell), Some(c));
        }
    }

    #[test]
    fn test_unsupported_maps() {
        assert!(UNSUPPORTED_1BYTE.is_unsupported());
        assert!(UNSUPPORTED_2BYTE.is_unsupported());
        assert_eq!(UNSUPPORTED_1BYTE.decode(0, 0), None);
        assert_eq!(UNSUPPORTED_2BYTE.decode(0, 0), None);
        assert_eq!(UNSUPPORTED_1BYTE.find('A'), None);

        assert!(GraphicSet::Macro.char_map().is_unsupported());
        assert!(!GraphicSet::KanjiStandard.char_map().is_unsupported());
    }

    #[test]
    fn test_graphic_set_two_byte() {
        assert!(!GraphicSet::Alnum.is_two_byte());
        assert!(!GraphicSet::JisXKata.is_two_byte());
        assert!(GraphicSet::KanjiStandard.is_two_byte());
        assert!(GraphicSet::KanjiAdditional.is_two_byte());
        assert!(GraphicSet::Unsupported2Byte.is_two_byte());
    }
}

//! ARIB STD-B24符号列のデコード。

use std::slice;

use thiserror::Error;

use crate::table::GraphicSet;

pub(crate) const ESC: u8 = 0x1B;
pub(crate) const LS0: u8 = 0x0F;
pub(crate) const LS1: u8 = 0x0E;
pub(crate) const SS2: u8 = 0x19;
pub(crate) const SS3: u8 = 0x1D;

/// 符号の指示先。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Designator {
    /// G0に対する指示。
    G0 = 0,
    /// G1に対する指示。
    G1 = 1,
    /// G2に対する指示。
    G2 = 2,
    /// G3に対する指示。
    G3 = 3,
}

/// 符号列をデコードする際のオプション。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// 初期状態でG0～G3に指示する符号集合。
    pub graphic_sets: [GraphicSet; 4],

    /// 初期状態でGLに呼び出す符号集合。
    pub gl: Designator,

    /// 初期状態でGRに呼び出す符号集合。
    pub gr: Designator,
}

impl Options {
    /// 番組情報など、通常の符号列をデコードする際のオプション。
    pub const DEFAULT: Options = Options {
        graphic_sets: [
            GraphicSet::KanjiStandard,
            GraphicSet::Kata,
            GraphicSet::Hira,
            GraphicSet::Alnum,
        ],
        gl: Designator::G0,
        gr: Designator::G1,
    };
}

impl Default for Options {
    fn default() -> Self {
        Options::DEFAULT
    }
}

/// デコードに失敗した際のエラー。
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// エスケープシーケンスの途中で符号列が終了した。
    #[error("truncated escape sequence")]
    TruncatedEscape,

    /// エスケープシーケンスの終端バイトが未知である。
    #[error("unknown escape sequence final byte 0x{0:02X}")]
    UnknownEscape(u8),

    /// 2バイト文字の途中で符号列が終了した。
    #[error("truncated character")]
    TruncatedChar,

    /// 符号表に割り当てのない文字符号が現れた。
    #[error("unassigned code point at row {row}, cell {cell}")]
    Unassigned {
        /// 行番号（0起点）。
        row: u8,
        /// セル番号（0起点）。
        cell: u8,
    },

    /// 未対応の符号集合で文字符号が現れた。
    #[error("character in unsupported graphic set")]
    UnsupportedSet,

    /// 図形領域にも制御符号にも該当しないバイトが現れた。
    #[error("stray byte 0x{0:02X}")]
    StrayByte(u8),

    /// マクロの中でマクロが呼び出された。
    #[error("macro invoked inside a macro")]
    MacroInMacro,
}

/// `options`に従い`data`をデコードし、`out`に追記する。
///
/// 失敗した場合でも、そこまでにデコードできた文字は`out`に残る。
/// 破棄するかどうかは呼び出し側が決める。
pub fn decode(out: &mut String, data: &[u8], options: Options) -> Result<(), DecodeError> {
    let mut decoder = Decoder::new(out, data, options);
    decoder.run()
}

/// ARIB STD-B24の符号列をデコードする。
///
/// 符号の指示・呼び出し状態は呼び出しごとに作り直され、呼び出しを跨いで共有されない。
struct Decoder<'a, 'b> {
    iter: slice::Iter<'a, u8>,
    out: &'b mut String,
    graphic_sets: [GraphicSet; 4],
    gl: Designator,
    gr: Designator,

    /// マクロ本体をデコードしている最中かどうか。マクロはネストできない。
    in_macro: bool,
}

impl<'a, 'b> Decoder<'a, 'b> {
    fn new(out: &'b mut String, data: &'a [u8], options: Options) -> Decoder<'a, 'b> {
        Decoder {
            iter: data.iter(),
            out,
            graphic_sets: options.graphic_sets,
            gl: options.gl,
            gr: options.gr,
            in_macro: false,
        }
    }

    /// 全バイトを消費するか、エラーが発生するまでデコードする。
    fn run(&mut self) -> Result<(), DecodeError> {
        while let Some(b) = self.iter.next().copied() {
            match b {
                // GL: 0x21..=0x7E
                c1 @ 0x21..=0x7E => self.graphic(self.gl, c1)?,

                // GR: 0xA1..=0xFE
                c1 @ 0xA1..=0xFE => self.graphic(self.gr, c1 & 0x7F)?,

                ESC => self.escape()?,

                LS0 => self.gl = Designator::G0,
                LS1 => self.gl = Designator::G1,

                SS2 => self.single_shift(Designator::G2)?,
                SS3 => self.single_shift(Designator::G3)?,

                // NUL
                0x00 => {}

                // SP
                0x20 => self.out.push(' '),

                b => return Err(DecodeError::StrayByte(b)),
            }
        }

        Ok(())
    }

    /// `g`に指示された符号集合で1文字をデコードする。
    ///
    /// `c1`は`0x21..=0x7E`にマスク済みの1バイト目である。
    fn graphic(&mut self, g: Designator, c1: u8) -> Result<(), DecodeError> {
        let set = self.graphic_sets[g as usize];
        if set == GraphicSet::Macro {
            return self.expand_macro(c1);
        }

        let map = set.char_map();
        let (row, cell) = if map.two_byte {
            let c2 = match self.iter.next().copied() {
                Some(c2 @ (0x21..=0x7E | 0xA1..=0xFE)) => c2 & 0x7F,
                Some(b) => return Err(DecodeError::StrayByte(b)),
                None => return Err(DecodeError::TruncatedChar),
            };
            (c1 - 0x21, c2 - 0x21)
        } else {
            (0, c1 - 0x21)
        };

        match map.decode(row, cell) {
            Some(c) => {
                self.out.push(c);
                Ok(())
            }
            None if map.is_unsupported() => Err(DecodeError::UnsupportedSet),
            None => Err(DecodeError::Unassigned { row, cell }),
        }
    }

    /// 単独シフトで次の1文字だけを`g`の符号集合でデコードする。
    ///
    /// GL・GRの呼び出し状態は変化しない。
    fn single_shift(&mut self, g: Designator) -> Result<(), DecodeError> {
        match self.iter.next().copied() {
            Some(c1 @ 0x21..=0x7E) => self.graphic(g, c1),
            Some(c1 @ 0xA1..=0xFE) => self.graphic(g, c1 & 0x7F),
            Some(b) => Err(DecodeError::StrayByte(b)),
            None => Err(DecodeError::TruncatedChar),
        }
    }

    /// `c1`の符号に定義されたマクロを展開する。
    ///
    /// マクロ本体は現在の指示・呼び出し状態の複製でデコードされるため、
    /// 本体内での指示は呼び出し元に影響しない。
    fn expand_macro(&mut self, c1: u8) -> Result<(), DecodeError> {
        if self.in_macro {
            return Err(DecodeError::MacroInMacro);
        }

        let body = default_macro(c1);
        if body.is_empty() {
            return Ok(());
        }
        log::debug!("macro 0x{:02X}: {} bytes", c1, body.len());

        let mut child = Decoder {
            iter: body.iter(),
            out: &mut *self.out,
            graphic_sets: self.graphic_sets,
            gl: self.gl,
            gr: self.gr,
            in_macro: true,
        };
        child.run()
    }

    /// ESCに続くエスケープシーケンスを処理する。
    fn escape(&mut self) -> Result<(), DecodeError> {
        /// `this.iter`を`n`バイト進めてG`g`へ`set`を指示する。
        fn designate(
            this: &mut Decoder,
            n: usize,
            g: u8,
            set: GraphicSet,
        ) -> Result<(), DecodeError> {
            debug_assert!((0x28..=0x2B).contains(&g));
            let _r = this.iter.nth(n - 1);
            debug_assert!(_r.is_some());

            this.graphic_sets[(g - 0x28) as usize] = set;
            Ok(())
        }
        fn invoke_gl(this: &mut Decoder, g: Designator) -> Result<(), DecodeError> {
            this.iter.next();
            this.gl = g;
            Ok(())
        }
        fn invoke_gr(this: &mut Decoder, g: Designator) -> Result<(), DecodeError> {
            this.iter.next();
            this.gr = g;
            Ok(())
        }

        match *self.iter.as_slice() {
            [] => Err(DecodeError::TruncatedEscape),

            // 符号の呼び出し

            // LS2
            [0x6E, ..] => invoke_gl(self, Designator::G2),
            // LS3
            [0x6F, ..] => invoke_gl(self, Designator::G3),
            // LS1R
            [0x7E, ..] => invoke_gr(self, Designator::G1),
            // LS2R
            [0x7D, ..] => invoke_gr(self, Designator::G2),
            // LS3R
            [0x7C, ..] => invoke_gr(self, Designator::G3),

            // 符号の指示

            // 2バイトDRCS
            [0x24, g @ 0x28..=0x2B, 0x20, f, ..] => designate(self, 4, g, drcs_2byte_set(f)?),

            // 中間バイトまでで符号列が尽きた
            [0x24] | [0x24, 0x28..=0x2B] | [0x24, 0x28..=0x2B, 0x20] => {
                Err(DecodeError::TruncatedEscape)
            }
            [0x28..=0x2B] | [0x28..=0x2B, 0x20] => Err(DecodeError::TruncatedEscape),

            // 2バイトGセット（G1～G3）
            [0x24, g @ 0x29..=0x2B, f, ..] => designate(self, 3, g, two_byte_set(f)?),
            // 2バイトGセット（G0）
            [0x24, f, ..] => designate(self, 2, 0x28, two_byte_set(f)?),
            // 1バイトDRCS・マクロ
            [g @ 0x28..=0x2B, 0x20, f, ..] => designate(self, 3, g, drcs_1byte_set(f)?),
            // 1バイトGセット
            [g @ 0x28..=0x2B, f, ..] => designate(self, 2, g, one_byte_set(f)?),

            [f, ..] => Err(DecodeError::UnknownEscape(f)),
        }
    }
}

/// 1バイトGセットの終端バイトから符号集合を得る。
fn one_byte_set(f: u8) -> Result<GraphicSet, DecodeError> {
    match f {
        // 英数・プロポーショナル英数
        0x4A | 0x36 => Ok(GraphicSet::Alnum),
        // 平仮名・プロポーショナル平仮名
        0x30 | 0x37 => Ok(GraphicSet::Hira),
        // 片仮名・プロポーショナル片仮名
        0x31 | 0x38 => Ok(GraphicSet::Kata),
        // JIS X 0201片仮名
        0x49 => Ok(GraphicSet::JisXKata),
        // モザイクA～D
        0x32..=0x35 => Ok(GraphicSet::Unsupported1Byte),
        _ => Err(DecodeError::UnknownEscape(f)),
    }
}

/// 2バイトGセットの終端バイトから符号集合を得る。
fn two_byte_set(f: u8) -> Result<GraphicSet, DecodeError> {
    match f {
        // 漢字・JIS互換漢字1面
        0x42 | 0x39 => Ok(GraphicSet::KanjiStandard),
        // 追加記号
        0x3B => Ok(GraphicSet::KanjiAdditional),
        // JIS互換漢字2面
        0x3A => Ok(GraphicSet::Unsupported2Byte),
        _ => Err(DecodeError::UnknownEscape(f)),
    }
}

/// 1バイトDRCSの終端バイトから符号集合を得る。
fn drcs_1byte_set(f: u8) -> Result<GraphicSet, DecodeError> {
    match f {
        // マクロ
        0x70 => Ok(GraphicSet::Macro),
        // DRCS-1～DRCS-15
        0x41..=0x4F => Ok(GraphicSet::Unsupported1Byte),
        _ => Err(DecodeError::UnknownEscape(f)),
    }
}

/// 2バイトDRCSの終端バイトから符号集合を得る。
fn drcs_2byte_set(f: u8) -> Result<GraphicSet, DecodeError> {
    match f {
        // DRCS-0
        0x40 => Ok(GraphicSet::Unsupported2Byte),
        _ => Err(DecodeError::UnknownEscape(f)),
    }
}

/// `c1`の符号に定義された既定のマクロ本体（ARIB STD-B24 表7-ま-1）。
///
/// 定義のない符号では空のスライスを返す。
fn default_macro(c1: u8) -> &'static [u8] {
    match c1 {
        0x60 => b"\x1B\x24\x42\x1B\x29\x4A\x1B\x2A\x30\x1B\x2B\x20\x70\x0F\x1B\x7D",
        0x61 => b"\x1B\x24\x42\x1B\x29\x31\x1B\x2A\x30\x1B\x2B\x20\x70\x0F\x1B\x7D",
        0x62 => b"\x1B\x24\x42\x1B\x29\x20\x41\x1B\x2A\x30\x1B\x2B\x20\x70\x0F\x1B\x7D",
        0x63 => b"\x1B\x28\x32\x1B\x29\x34\x1B\x2A\x35\x1B\x2B\x20\x70\x0F\x1B\x7D",
        0x64 => b"\x1B\x28\x32\x1B\x29\x33\x1B\x2A\x35\x1B\x2B\x20\x70\x0F\x1B\x7D",
        0x65 => b"\x1B\x28\x32\x1B\x29\x20\x41\x1B\x2A\x35\x1B\x2B\x20\x70\x0F\x1B\x7D",
        0x66 => b"\x1B\x28\x20\x41\x1B\x29\x20\x42\x1B\x2A\x20\x43\x1B\x2B\x20\x70\x0F\x1B\x7D",
        0x67 => b"\x1B\x28\x20\x44\x1B\x29\x20\x45\x1B\x2A\x20\x46\x1B\x2B\x20\x70\x0F\x1B\x7D",
        0x68 => b"\x1B\x28\x20\x47\x1B\x29\x20\x48\x1B\x2A\x20\x49\x1B\x2B\x20\x70\x0F\x1B\x7D",
        0x69 => b"\x1B\x28\x20\x4A\x1B\x29\x20\x4B\x1B\x2A\x20\x4C\x1B\x2B\x20\x70\x0F\x1B\x7D",
        0x6A => b"\x1B\x28\x20\x4D\x1B\x29\x20\x4E\x1B\x2A\x20\x4F\x1B\x2B\x20\x70\x0F\x1B\x7D",
        0x6B => b"\x1B\x24\x42\x1B\x29\x20\x42\x1B\x2A\x30\x1B\x2B\x20\x70\x0F\x1B\x7D",
        0x6C => b"\x1B\x24\x42\x1B\x29\x20\x43\x1B\x2A\x30\x1B\x2B\x20\x70\x0F\x1B\x7D",
        0x6D => b"\x1B\x24\x42\x1B\x29\x20\x44\x1B\x2A\x30\x1B\x2B\x20\x70\x0F\x1B\x7D",
        0x6E => b"\x1B\x28\x31\x1B\x29\x30\x1B\x2A\x4A\x1B\x2B\x20\x70\x0F\x1B\x7D",
        0x6F => b"\x1B\x28\x4A\x1B\x29\x32\x1B\x2A\x20\x41\x1B\x2B\x20\x70\x0F\x1B\x7D",
        _ => b"",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use hex_literal::hex;

    fn decode_ok(data: &[u8]) -> String {
        let mut out = String::new();
        decode(&mut out, data, Options::DEFAULT).unwrap();
        out
    }

    fn decode_err(data: &[u8]) -> (String, DecodeError) {
        let mut out = String::new();
        let e = decode(&mut out, data, Options::DEFAULT).unwrap_err();
        (out, e)
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode_ok(b""), "");
    }

    #[test]
    fn test_decode_gl_gr_defaults() {
        // GL＝G0は標準漢字：16区1点「亜」、4区2点「あ」
        assert_eq!(decode_ok(&hex!("30 21 24 22")), "亜あ");

        // GR＝G1は片仮名：0xA1は行0セル0の「ァ」
        assert_eq!(decode_ok(&hex!("A1")), "ァ");
        assert_eq!(decode_ok(&hex!("A2 A4")), "アイ");
    }

    #[test]
    fn test_decode_sp_nul() {
        assert_eq!(decode_ok(&hex!("A2 20 A4")), "ア イ");
        assert_eq!(decode_ok(&hex!("00 A2 00")), "ア");
    }

    #[test]
    fn test_decode_designation() {
        // G0に英数を指示してから「AB」
        assert_eq!(decode_ok(&hex!("1B 28 4A 41 42")), "AB");

        // 指示は同じ符号への次の指示まで持続する
        assert_eq!(
            decode_ok(&hex!("1B 24 42 30 21 1B 28 4A 41")),
            "亜A",
        );

        // G1に2バイト集合を指示するとGR側もEUC風の2バイトになる
        assert_eq!(decode_ok(&hex!("1B 24 29 42 B0 A1")), "亜");

        // プロポーショナル英数は固定ピッチと同じ符号表を使う
        assert_eq!(decode_ok(&hex!("1B 28 36 41")), "A");
    }

    #[test]
    fn test_decode_locking_shift() {
        // LS1でGLをG1（片仮名）に、LS0でG0（漢字）に戻す
        assert_eq!(decode_ok(&hex!("0E 22 0F 30 21")), "ア亜");

        // ESCによるLS2でGLをG2（平仮名）へ
        assert_eq!(decode_ok(&hex!("1B 6E 22")), "あ");

        // LS1RでGRをG1へ呼び出し直しても既定と同じ片仮名
        assert_eq!(decode_ok(&hex!("1B 7E A2")), "ア");
        // LS3RでGRをG3（英数）へ
        assert_eq!(decode_ok(&hex!("1B 7C C1")), "A");
    }

    #[test]
    fn test_decode_single_shift() {
        // SS2はG2（平仮名）で1文字だけデコードし、GLは漢字のまま
        assert_eq!(decode_ok(&hex!("19 22 30 21")), "あ亜");

        // SS3はG3（英数）で1文字だけ
        assert_eq!(decode_ok(&hex!("1D 41 30 21")), "A亜");

        // GR側のバイトでも同様
        assert_eq!(decode_ok(&hex!("19 A2 A1")), "あァ");
    }

    #[test]
    fn test_decode_truncated() {
        assert_matches!(decode_err(&hex!("1B")), (_, DecodeError::TruncatedEscape));
        assert_matches!(
            decode_err(&hex!("1B 24")),
            (_, DecodeError::TruncatedEscape)
        );
        assert_matches!(
            decode_err(&hex!("1B 28 20")),
            (_, DecodeError::TruncatedEscape)
        );

        // 2バイト文字の途中で終了
        assert_matches!(decode_err(&hex!("30")), (_, DecodeError::TruncatedChar));
        // 単独シフトの直後に終了
        assert_matches!(decode_err(&hex!("19")), (_, DecodeError::TruncatedChar));
    }

    #[test]
    fn test_decode_unknown_escape() {
        assert_matches!(
            decode_err(&hex!("1B 28 21 41")),
            (_, DecodeError::UnknownEscape(0x21))
        );
        assert_matches!(
            decode_err(&hex!("1B 24 21")),
            (_, DecodeError::UnknownEscape(0x21))
        );
        assert_matches!(
            decode_err(&hex!("1B 40")),
            (_, DecodeError::UnknownEscape(0x40))
        );
    }

    #[test]
    fn test_decode_unsupported_set() {
        // モザイクAを指示した後の文字符号は失敗する
        let (out, e) = decode_err(&hex!("A2 1B 28 32 41"));
        assert_eq!(e, DecodeError::UnsupportedSet);
        // 失敗してもデコード済みの出力は残る
        assert_eq!(out, "ア");
    }

    #[test]
    fn test_decode_unassigned() {
        // 9区は未割当
        assert_matches!(
            decode_err(&hex!("29 21")),
            (_, DecodeError::Unassigned { row: 8, cell: 0 })
        );
        // 平仮名集合の0x74は未割当
        assert_matches!(
            decode_err(&hex!("1B 28 30 74")),
            (_, DecodeError::Unassigned { row: 0, cell: 0x53 })
        );
    }

    #[test]
    fn test_decode_stray_byte() {
        assert_matches!(decode_err(&hex!("80")), (_, DecodeError::StrayByte(0x80)));
        assert_matches!(decode_err(&hex!("0C")), (_, DecodeError::StrayByte(0x0C)));
        // 2バイト文字の2バイト目が図形領域外
        assert_matches!(
            decode_err(&hex!("30 0D")),
            (_, DecodeError::StrayByte(0x0D))
        );
    }

    #[test]
    fn test_decode_macro() {
        // G0にマクロを指示し0x60のマクロを展開する。
        // 本体は指示・呼び出しのみで出力は生まない。
        assert_eq!(decode_ok(&hex!("1B 28 20 70 60")), "");

        // マクロ内の指示は複製された状態に対するもので、呼び出し元には影響しない。
        // マクロ実行後もG0はマクロのままであり、GR＝G1は片仮名のまま。
        assert_eq!(decode_ok(&hex!("1B 28 20 70 60 A1 61 A2")), "ァア");

        // 定義のない符号のマクロは何も出力しない
        assert_eq!(decode_ok(&hex!("1B 28 20 70 21 A1")), "ァ");
    }

    #[test]
    fn test_decode_macro_in_macro() {
        // マクロ本体をデコード中のマクロ呼び出しは失敗する
        let mut out = String::new();
        let mut child = Decoder::new(&mut out, &hex!("60"), Options::DEFAULT);
        child.graphic_sets[0] = GraphicSet::Macro;
        child.in_macro = true;
        assert_matches!(child.run(), Err(DecodeError::MacroInMacro));
    }

    #[test]
    fn test_decode_all_gl_bytes_alnum() {
        // 全域が割り当て済みの1バイト集合ではGL全バイトが1文字ずつになる
        let data: Vec<u8> = (0x21..=0x7E).collect();
        let mut out = String::new();
        decode(
            &mut out,
            &data,
            Options {
                graphic_sets: [
                    GraphicSet::Alnum,
                    GraphicSet::Kata,
                    GraphicSet::Hira,
                    GraphicSet::Alnum,
                ],
                gl: Designator::G0,
                gr: Designator::G1,
            },
        )
        .unwrap();
        assert_eq!(out.chars().count(), data.len());
        assert!(out.starts_with('!'));
        assert!(out.ends_with('~'));
    }
}

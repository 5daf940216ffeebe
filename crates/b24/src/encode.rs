//! ARIB STD-B24符号列へのエンコード。

use arrayvec::ArrayVec;

use crate::decode::{Designator, Options, ESC, LS0, LS1};
use crate::table::GraphicSet;

/// [`encode`]の結果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeResult {
    /// バッファに書き込んだバイト数。
    pub written: usize,

    /// 消費した入力の文字数。
    ///
    /// 表現できない文字に当たった場合やバッファが尽きた場合、
    /// 入力の文字数より少なくなる。
    pub consumed: usize,
}

/// 1文字のエンコードで書き込まれる符号列の最大長。
///
/// 指示（最大4バイト）、呼び出し（最大2バイト）、文字符号（最大2バイト）の合計。
const MAX_CHAR_SEQ: usize = 8;

/// エンコードで文字を探す符号集合と、その優先順。
const ENCODE_ORDER: [GraphicSet; 6] = [
    GraphicSet::Alnum,
    GraphicSet::Hira,
    GraphicSet::Kata,
    GraphicSet::JisXKata,
    GraphicSet::KanjiStandard,
    GraphicSet::KanjiAdditional,
];

/// `c`が割り当てられた符号集合と行・セルを優先順で検索する。
fn find_char(c: char) -> Option<(GraphicSet, u8, u8)> {
    ENCODE_ORDER
        .iter()
        .find_map(|&set| set.char_map().find(c).map(|(row, cell)| (set, row, cell)))
}

/// `text`全体がこの符号で表現可能かどうかを返す。
///
/// 状態を持たない純粋な問い合わせであり、何度呼び出しても結果は変わらない。
pub fn can_encode(text: &str) -> bool {
    text.chars().all(|c| c == ' ' || find_char(c).is_some())
}

/// `options`を初期状態として`text`を`buf`に収まる分だけエンコードする。
///
/// 文字とその切り替えに必要な符号が`buf`の残りに収まらなくなるか、
/// 表現できない文字に当たった時点でエンコードを打ち切る。
/// どこまで進んだかは戻り値で報告され、バッファの不足はエラーとして扱われない。
///
/// `options`を[`Options::DEFAULT`]とした出力は[`decode`][`crate::decode::decode`]で
/// 元の文字列に復元できる。
pub fn encode(buf: &mut [u8], text: &str, options: Options) -> EncodeResult {
    let mut encoder = Encoder::new(options);
    let mut written = 0;
    let mut consumed = 0;

    for c in text.chars() {
        let mut seq = ArrayVec::<u8, MAX_CHAR_SEQ>::new();
        if c == ' ' {
            seq.push(0x20);
        } else {
            let Some((set, row, cell)) = find_char(c) else {
                log::trace!("unencodable character {:?}", c);
                break;
            };
            encoder.push_char(set, row, cell, &mut seq);
        }

        if buf.len() - written < seq.len() {
            break;
        }

        buf[written..written + seq.len()].copy_from_slice(&seq);
        written += seq.len();
        consumed += 1;
    }

    EncodeResult { written, consumed }
}

/// 符号の指示・呼び出し状態を追跡しながら符号列を組み立てる。
#[derive(Debug, Clone, Copy)]
struct Encoder {
    graphic_sets: [GraphicSet; 4],
    gl: Designator,
    gr: Designator,
}

impl Encoder {
    fn new(options: Options) -> Encoder {
        Encoder {
            graphic_sets: options.graphic_sets,
            gl: options.gl,
            gr: options.gr,
        }
    }

    /// `set`の行`row`・セル`cell`の文字符号を、必要な切り替えと共に`seq`へ積む。
    fn push_char(
        &mut self,
        set: GraphicSet,
        row: u8,
        cell: u8,
        seq: &mut ArrayVec<u8, MAX_CHAR_SEQ>,
    ) {
        if self.graphic_sets[self.gr as usize] == set {
            // GRに呼び出し済みなのでそのまま出力できる
            if set.is_two_byte() {
                seq.push(0xA1 + row);
            }
            seq.push(0xA1 + cell);
            return;
        }

        if self.graphic_sets[self.gl as usize] != set {
            match self.designated(set) {
                // 指示済みの符号をGLへ呼び出す
                Some(g) => self.invoke_gl(g, seq),
                // どの符号にも指示されていないため指示してから呼び出す
                None => {
                    // 2バイト集合はG0、1バイト集合はG1を使う
                    let g = if set.is_two_byte() {
                        Designator::G0
                    } else {
                        Designator::G1
                    };
                    self.designate(g, set, seq);
                    if self.gl != g {
                        self.invoke_gl(g, seq);
                    }
                }
            }
        }

        if set.is_two_byte() {
            seq.push(0x21 + row);
        }
        seq.push(0x21 + cell);
    }

    /// `set`が指示されている符号を返す。
    fn designated(&self, set: GraphicSet) -> Option<Designator> {
        const DESIGNATORS: [Designator; 4] = [
            Designator::G0,
            Designator::G1,
            Designator::G2,
            Designator::G3,
        ];
        DESIGNATORS
            .into_iter()
            .find(|&g| self.graphic_sets[g as usize] == set)
    }

    /// G`g`をGLへ呼び出す符号を`seq`へ積む。
    fn invoke_gl(&mut self, g: Designator, seq: &mut ArrayVec<u8, MAX_CHAR_SEQ>) {
        match g {
            Designator::G0 => seq.push(LS0),
            Designator::G1 => seq.push(LS1),
            // LS2
            Designator::G2 => seq.extend([ESC, 0x6E]),
            // LS3
            Designator::G3 => seq.extend([ESC, 0x6F]),
        }
        self.gl = g;
    }

    /// G`g`へ`set`を指示するエスケープシーケンスを`seq`へ積む。
    fn designate(&mut self, g: Designator, set: GraphicSet, seq: &mut ArrayVec<u8, MAX_CHAR_SEQ>) {
        let f = final_byte(set);
        if set.is_two_byte() {
            match g {
                Designator::G0 => seq.extend([ESC, 0x24, f]),
                g => seq.extend([ESC, 0x24, 0x28 + g as u8, f]),
            }
        } else {
            seq.extend([ESC, 0x28 + g as u8, f]);
        }
        self.graphic_sets[g as usize] = set;
    }
}

/// エンコードで使う符号集合の終端バイト。
fn final_byte(set: GraphicSet) -> u8 {
    match set {
        GraphicSet::Alnum => 0x4A,
        GraphicSet::Hira => 0x30,
        GraphicSet::Kata => 0x31,
        GraphicSet::JisXKata => 0x49,
        GraphicSet::KanjiStandard => 0x42,
        GraphicSet::KanjiAdditional => 0x3B,
        // ENCODE_ORDERに含まれない集合へ切り替えることはない
        GraphicSet::Unsupported1Byte
        | GraphicSet::Unsupported2Byte
        | GraphicSet::Macro => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode;
    use hex_literal::hex;

    fn encode_all(text: &str) -> Vec<u8> {
        let mut buf = [0; 256];
        let r = encode(&mut buf, text, Options::DEFAULT);
        assert_eq!(r.consumed, text.chars().count());
        buf[..r.written].to_vec()
    }

    fn roundtrip(text: &str) {
        let bytes = encode_all(text);
        let mut out = String::new();
        decode(&mut out, &bytes, Options::DEFAULT).unwrap();
        assert_eq!(out, text, "bytes: {:02X?}", bytes);
    }

    #[test]
    fn test_can_encode() {
        assert!(can_encode(""));
        assert!(can_encode("ABC xyz 012"));
        assert!(can_encode("あいうえおアイウエオ"));
        assert!(can_encode("漢字と仮名の混在テキスト"));
        assert!(can_encode("ｶﾀｶﾅ"));

        assert!(!can_encode("étranger"));
        assert!(!can_encode("絵文字🎉入り"));

        // 純粋な問い合わせであり繰り返しても結果は同じ
        assert!(can_encode("同じ入力"));
        assert!(can_encode("同じ入力"));
    }

    #[test]
    fn test_encode_empty() {
        let mut buf = [0; 16];
        assert_eq!(
            encode(&mut buf, "", Options::DEFAULT),
            EncodeResult {
                written: 0,
                consumed: 0
            },
        );
    }

    #[test]
    fn test_encode_uses_default_state() {
        // 既定のGL＝G0は標準漢字なのでそのまま2バイト出力できる
        assert_eq!(encode_all("亜"), hex!("30 21"));

        // 既定のGR＝G1は片仮名なので1バイトで出力できる
        assert_eq!(encode_all("ア"), hex!("A2"));

        // 空白はSPそのもの
        assert_eq!(encode_all(" "), hex!("20"));
    }

    #[test]
    fn test_encode_invoke_designated() {
        // 平仮名はG2に指示済みなのでLS2の呼び出しだけでよい
        assert_eq!(encode_all("あ"), hex!("1B 6E 22"));

        // 英数はG3に指示済みなのでLS3だけでよく、以降は切り替え不要
        assert_eq!(encode_all("AB"), hex!("1B 6F 41 42"));
    }

    #[test]
    fn test_encode_designate() {
        // JIS X 0201片仮名はどこにも指示されていないため、
        // G1へ指示した上でLS1で呼び出す
        assert_eq!(encode_all("ｱ"), hex!("1B 29 49 0E 31"));
    }

    #[test]
    fn test_encode_reuses_state() {
        // 最初の1文字で切り替えた後は文字符号のみが続く
        let bytes = encode_all("アイウ");
        assert_eq!(bytes, hex!("A2 A4 A6"));

        let bytes = encode_all("ABC");
        assert_eq!(bytes, hex!("1B 6F 41 42 43"));
    }

    #[test]
    fn test_encode_unencodable_stops() {
        let mut buf = [0; 64];
        let r = encode(&mut buf, "AB€CD", Options::DEFAULT);
        assert_eq!(r.consumed, 2);

        let mut out = String::new();
        decode(&mut out, &buf[..r.written], Options::DEFAULT).unwrap();
        assert_eq!(out, "AB");
    }

    #[test]
    fn test_encode_buffer_exhaustion() {
        // 「亜」1文字には2バイト必要なので1バイトのバッファでは書けない
        let mut buf = [0; 1];
        assert_eq!(
            encode(&mut buf, "亜", Options::DEFAULT),
            EncodeResult {
                written: 0,
                consumed: 0
            },
        );

        // 収まる分だけ書いて消費数を返す
        let mut buf = [0; 4];
        let r = encode(&mut buf, "亜唖娃", Options::DEFAULT);
        assert_eq!(r.consumed, 2);
        assert_eq!(r.written, 4);

        // 残りを別のバッファへ続けてエンコードすれば連結が元に戻る
        let mut buf2 = [0; 16];
        let rest: String = "亜唖娃".chars().skip(r.consumed).collect();
        let r2 = encode(&mut buf2, &rest, Options::DEFAULT);
        assert_eq!(r2.consumed, 1);

        let mut out = String::new();
        let all = [&buf[..r.written], &buf2[..r2.written]].concat();
        decode(&mut out, &all, Options::DEFAULT).unwrap();
        assert_eq!(out, "亜唖娃");
    }

    #[test]
    fn test_roundtrip() {
        roundtrip("");
        roundtrip("ABC xyz 012 !#$%&'()");
        roundtrip("あいうえお");
        roundtrip("アイウエオ");
        roundtrip("ｱｲｳｴｵ");
        roundtrip("日本語の番組表テキスト");
        roundtrip("漢字 かな カナ ｶﾅ ABC 123");
        roundtrip("「引用」と、句読点。中黒・長音ー");
    }
}

//! 文字符号集合の汎用インターフェース。

use std::fmt;

use indexmap::IndexMap;

use crate::decode::{self, DecodeError, Options};
use crate::encode::{self, EncodeResult};

/// 文字符号集合が提供する機能。
///
/// テーブルやフィールドのパーサーは、対象のフィールドがどの符号を使うかを
/// 自ら決めた上で、このインターフェースを通してテキストを変換する。
///
/// 実装は呼び出しごとに独立した状態で動作しなければならず、
/// 同じインスタンスを複数スレッドから同時に呼び出せる。
pub trait Charset: Sync {
    /// 符号の名前。
    fn name(&self) -> &'static str;

    /// `data`をデコードして`out`へ追記する。
    ///
    /// 失敗した場合でも途中までの出力は`out`に残り、
    /// 破棄するかどうかは呼び出し側が決める。
    fn decode(&self, out: &mut String, data: &[u8]) -> Result<(), DecodeError>;

    /// `text`全体がこの符号で表現可能かどうかを返す。
    fn can_encode(&self, text: &str) -> bool;

    /// `text`を`buf`に収まる分だけエンコードする。
    fn encode(&self, buf: &mut [u8], text: &str) -> EncodeResult;
}

/// ARIB STD-B24の8単位符号。
///
/// 番組情報などの既定の指示状態（[`Options::DEFAULT`]）で変換する。
#[derive(Debug, Default, Clone, Copy)]
pub struct AribB24;

/// [`AribB24`]の共有インスタンス。
pub static ARIB_B24: AribB24 = AribB24;

impl Charset for AribB24 {
    fn name(&self) -> &'static str {
        "ARIB-STD-B24"
    }

    fn decode(&self, out: &mut String, data: &[u8]) -> Result<(), DecodeError> {
        decode::decode(out, data, Options::DEFAULT)
    }

    fn can_encode(&self, text: &str) -> bool {
        encode::can_encode(text)
    }

    fn encode(&self, buf: &mut [u8], text: &str) -> EncodeResult {
        encode::encode(buf, text, Options::DEFAULT)
    }
}

/// 名前から文字符号集合を引くためのレジストリ。
///
/// アプリケーションが起動時に生成して保持し、
/// 符号を必要とする部品へ渡して使う。登録順は保持される。
pub struct CharsetRegistry {
    charsets: IndexMap<&'static str, &'static dyn Charset>,
}

impl CharsetRegistry {
    /// 組み込みの符号が登録されたレジストリを生成する。
    pub fn new() -> CharsetRegistry {
        let mut registry = CharsetRegistry {
            charsets: IndexMap::new(),
        };
        registry.register(&ARIB_B24);
        registry
    }

    /// `charset`を登録する。
    ///
    /// 同名の符号が登録済みの場合は置き換える。
    pub fn register(&mut self, charset: &'static dyn Charset) {
        if self.charsets.insert(charset.name(), charset).is_some() {
            log::warn!("charset {} re-registered", charset.name());
        }
    }

    /// `name`の符号を取得する。
    #[inline]
    pub fn get(&self, name: &str) -> Option<&'static dyn Charset> {
        self.charsets.get(name).copied()
    }

    /// 登録された符号を登録順に列挙する。
    pub fn iter(&self) -> impl Iterator<Item = &'static dyn Charset> + '_ {
        self.charsets.values().copied()
    }
}

impl Default for CharsetRegistry {
    fn default() -> CharsetRegistry {
        CharsetRegistry::new()
    }
}

impl fmt::Debug for CharsetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.charsets.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_arib_b24_charset() {
        let charset: &dyn Charset = &ARIB_B24;
        assert_eq!(charset.name(), "ARIB-STD-B24");

        let mut out = String::new();
        charset.decode(&mut out, &hex!("30 21 A2")).unwrap();
        assert_eq!(out, "亜ア");

        assert!(charset.can_encode("亜ア"));

        let mut buf = [0; 16];
        let r = charset.encode(&mut buf, "亜ア");
        assert_eq!(r.consumed, 2);
        let mut out = String::new();
        charset.decode(&mut out, &buf[..r.written]).unwrap();
        assert_eq!(out, "亜ア");
    }

    #[test]
    fn test_registry() {
        let registry = CharsetRegistry::new();
        let charset = registry.get("ARIB-STD-B24").unwrap();
        assert_eq!(charset.name(), "ARIB-STD-B24");
        assert!(registry.get("ISO-8859-1").is_none());

        assert_eq!(
            registry.iter().map(|c| c.name()).collect::<Vec<_>>(),
            ["ARIB-STD-B24"],
        );
    }

    #[test]
    fn test_registry_register() {
        struct Dummy;
        impl Charset for Dummy {
            fn name(&self) -> &'static str {
                "DUMMY"
            }
            fn decode(&self, _: &mut String, _: &[u8]) -> Result<(), DecodeError> {
                Ok(())
            }
            fn can_encode(&self, _: &str) -> bool {
                false
            }
            fn encode(&self, _: &mut [u8], _: &str) -> EncodeResult {
                EncodeResult {
                    written: 0,
                    consumed: 0,
                }
            }
        }
        static DUMMY: Dummy = Dummy;

        let mut registry = CharsetRegistry::new();
        registry.register(&DUMMY);
        assert!(registry.get("DUMMY").is_some());
        assert_eq!(registry.iter().count(), 2);
    }
}

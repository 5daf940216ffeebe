use b24::charset::{Charset, ARIB_B24};

#[derive(Debug)]
struct AppArgs {
    encode: bool,
    input: String,
}

impl AppArgs {
    const HELP: &str = "\
ARIB STD-B24の符号列を変換するコマンド

USAGE:
  transcode [OPTIONS] [INPUT]

FLAGS:
  -h, --help    このヘルプを表示する
  -e, --encode  テキストを符号列にエンコードして16進で表示する。
                未指定の場合は16進の符号列をテキストにデコードする。

ARGS:
  <INPUT>       16進の符号列（例：1B284A4142）またはテキスト
";

    pub fn parse() -> Result<AppArgs, Box<dyn std::error::Error>> {
        let mut args = pico_args::Arguments::from_env();

        if args.contains(["-h", "--help"]) {
            println!("{}", Self::HELP);
            std::process::exit(0);
        }

        let encode = args.contains(["-e", "--encode"]);

        Ok(AppArgs {
            encode,
            input: args.free_from_str()?,
        })
    }
}

fn parse_hex(s: &str) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let s: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if s.len() % 2 != 0 {
        return Err("奇数桁の16進文字列".into());
    }

    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(Into::into))
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = AppArgs::parse()?;

    if args.encode {
        if !ARIB_B24.can_encode(&args.input) {
            log::warn!("表現できない文字が含まれるため途中までしか変換されない");
        }

        let mut buf = vec![0; args.input.len() * 8];
        let r = ARIB_B24.encode(&mut buf, &args.input);
        let hex: Vec<String> = buf[..r.written].iter().map(|b| format!("{:02X}", b)).collect();
        println!("{}", hex.join(" "));
    } else {
        let data = parse_hex(&args.input)?;

        let mut text = String::new();
        let result = ARIB_B24.decode(&mut text, &data);
        println!("{}", text);
        result?;
    }

    Ok(())
}

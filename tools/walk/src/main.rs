//! 遍历一个 epoch 并输出统计.
//!
//! 用法: `walk [batch_size] [sync|prefetch] [npy|nii|dcm]`,
//! 缺省为 `16 prefetch npy`. 数据目录见 [`loader::data_dir_from_env_or_home`].

use dicom_berry::{ImageDecoder, LoadMode, NiftiDecoder, NpyDecoder};
use profile::Profile;
use result::WalkResult;
use std::env;
use std::process::ExitCode;

mod loader;
mod profile;
mod result;

const DEFAULT_BATCH_SIZE: usize = 16;

fn parse_mode(s: &str) -> Option<LoadMode> {
    match s {
        "sync" => Some(LoadMode::Sync),
        "prefetch" => Some(LoadMode::Prefetch),
        _ => None,
    }
}

/// 打开数据集, 遍历一个 epoch.
fn walk<D: ImageDecoder + Send + Sync + 'static>(
    decoder: D,
    batch_size: usize,
    mode: LoadMode,
) -> Result<Profile, String> {
    let index = loader::index_from_env_or_home(decoder, mode)?;
    let summary = index.summary();
    log::info!("{summary:?}");

    let mut it = index.iterate(batch_size, true);
    let mut p = Profile::new();
    loop {
        p.wait_start();
        let next = it.next_batch();
        p.wait_elapsed();
        let Some(batch) = next else {
            break;
        };
        let batch = batch.map_err(|e| e.to_string())?;
        p.count_batch(&batch);
    }
    log::debug!("{} records released", it.released());
    Ok(p.finish())
}

fn main() -> ExitCode {
    if let Err(e) = simple_logger::init_with_env() {
        eprintln!("cannot initialize logger: {e}");
    }

    let args: Vec<String> = env::args().skip(1).collect();
    let batch_size = match args.first().map(|s| s.parse::<usize>()) {
        None => DEFAULT_BATCH_SIZE,
        Some(Ok(n)) if n > 0 => n,
        Some(_) => {
            eprintln!("batch size must be a positive integer");
            return ExitCode::FAILURE;
        }
    };
    let Some(mode) = parse_mode(args.get(1).map_or("prefetch", String::as_str)) else {
        eprintln!("mode must be `sync` or `prefetch`");
        return ExitCode::FAILURE;
    };
    let decoder = args.get(2).map_or("npy", String::as_str);

    let profile = match decoder {
        "npy" => walk(NpyDecoder, batch_size, mode),
        "nii" => walk(NiftiDecoder, batch_size, mode),
        #[cfg(feature = "dicom")]
        "dcm" => walk(dicom_berry::DicomDecoder, batch_size, mode),
        other => Err(format!("unsupported decoder `{other}`")),
    };
    match profile {
        Ok(p) => {
            let name = format!("{decoder}, {mode:?}, batch {batch_size}");
            if let Err(e) = WalkResult::new(name, p).report() {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

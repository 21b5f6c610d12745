use std::{
    fs::{self, File},
    io::{self, Cursor, Write},
    path::{Path, PathBuf},
};

use image::{
    DynamicImage, ExtendedColorType, ImageReader, RgbaImage,
    codecs::ico::{IcoEncoder, IcoFrame},
    imageops::{self, FilterType},
};

use crate::{
    error::{ConvertError, Error, ValidationError},
    sizes::IconSize,
};

#[derive(Debug, Clone, Copy)]
pub struct ConvertOptions {
    pub filter: FilterType,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            filter: FilterType::Lanczos3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub output: PathBuf,
    pub sizes: Vec<IconSize>,
    pub source_dimensions: (u32, u32),
    pub bytes_written: usize,
}

/// Converts `input` into a multi-resolution ICO at `output`.
///
/// One frame is rendered per entry of `sizes`. The destination is replaced
/// atomically; when anything fails it is left as it was and no temporary
/// file remains.
pub fn convert_to_ico(
    input: &Path,
    output: &Path,
    sizes: &[IconSize],
    options: &ConvertOptions,
) -> Result<ConversionReport, Error> {
    let sizes = normalize_sizes(sizes)?;

    let image = open_rgba(input)?;
    let source_dimensions = (image.width(), image.height());
    log::debug!(
        "decoded {} ({}x{})",
        input.display(),
        source_dimensions.0,
        source_dimensions.1
    );

    let bytes = encode_ico(&image, &sizes, options.filter)?;
    drop(image);

    write_atomically(output, &bytes).map_err(|source| ConvertError::Write {
        path: output.to_path_buf(),
        source,
    })?;
    log::info!(
        "wrote {} ({} bytes, {} sizes)",
        output.display(),
        bytes.len(),
        sizes.len()
    );

    Ok(ConversionReport {
        output: output.to_path_buf(),
        sizes,
        source_dimensions,
        bytes_written: bytes.len(),
    })
}

fn normalize_sizes(sizes: &[IconSize]) -> Result<Vec<IconSize>, ValidationError> {
    if sizes.is_empty() {
        return Err(ValidationError::NoSizeSelected);
    }
    let mut unique: Vec<IconSize> = Vec::with_capacity(sizes.len());
    for size in sizes {
        if !size.is_valid() {
            return Err(ValidationError::SizeOutOfRange(size.width.max(size.height)));
        }
        if !unique.contains(size) {
            unique.push(*size);
        }
    }
    Ok(unique)
}

/// Decodes `path`, detecting the format from content, as 8-bit RGBA.
fn open_rgba(path: &Path) -> Result<DynamicImage, ConvertError> {
    let open_err = |source: io::Error| ConvertError::Open {
        path: path.to_path_buf(),
        source,
    };
    let reader = ImageReader::open(path)
        .map_err(open_err)?
        .with_guessed_format()
        .map_err(open_err)?;
    let image = reader.decode().map_err(|source| ConvertError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(match image {
        rgba @ DynamicImage::ImageRgba8(_) => rgba,
        other => DynamicImage::ImageRgba8(other.to_rgba8()),
    })
}

fn encode_ico(
    image: &DynamicImage,
    sizes: &[IconSize],
    filter: FilterType,
) -> Result<Vec<u8>, ConvertError> {
    let mut frames = Vec::with_capacity(sizes.len());
    for size in sizes {
        let canvas = render_frame(image, *size, filter);
        let frame = IcoFrame::as_png(
            canvas.as_raw(),
            size.width,
            size.height,
            ExtendedColorType::Rgba8,
        )
        .map_err(ConvertError::Encode)?;
        frames.push(frame);
    }

    let mut buf = Cursor::new(Vec::new());
    IcoEncoder::new(&mut buf)
        .encode_images(&frames)
        .map_err(ConvertError::Encode)?;
    Ok(buf.into_inner())
}

/// Resamples to fit `size` keeping the aspect ratio, centered on a
/// transparent canvas of exactly `size`.
fn render_frame(image: &DynamicImage, size: IconSize, filter: FilterType) -> RgbaImage {
    let fitted = image.resize(size.width, size.height, filter).into_rgba8();
    if fitted.dimensions() == (size.width, size.height) {
        return fitted;
    }

    let mut canvas = RgbaImage::new(size.width, size.height);
    let x = (size.width - fitted.width()) / 2;
    let y = (size.height - fitted.height()) / 2;
    imageops::replace(&mut canvas, &fitted, i64::from(x), i64::from(y));
    canvas
}

/// Writes to a hidden sibling file, syncs it and renames it over `path`.
fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "output path has no file name")
    })?;
    let tmp_path = path.with_file_name(format!(
        ".{}.{}.tmp",
        file_name.to_string_lossy(),
        std::process::id()
    ));

    let result = (|| -> io::Result<()> {
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba};

    struct TempDir(PathBuf);

    impl TempDir {
        fn new(name: &str) -> Self {
            let dir = std::env::temp_dir().join(format!(
                "img2ico-{name}-{}",
                std::process::id()
            ));
            let _ = fs::remove_dir_all(&dir);
            fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }

        fn path(&self, file: &str) -> PathBuf {
            self.0.join(file)
        }

        fn file_names(&self) -> Vec<String> {
            let mut names: Vec<String> = fs::read_dir(&self.0)
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            names
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 3 % 256) as u8, 128, 255])
        });
        img.save(path).unwrap();
    }

    fn write_jpeg(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 64])
        });
        img.save(path).unwrap();
    }

    fn read_icon(path: &Path) -> ico::IconDir {
        let file = File::open(path).unwrap();
        ico::IconDir::read(file).unwrap()
    }

    #[test]
    fn png_to_single_32() {
        let dir = TempDir::new("png32");
        let input = dir.path("source.png");
        let output = dir.path("icon.ico");
        write_png(&input, 300, 300);

        let report = convert_to_ico(
            &input,
            &output,
            &[IconSize::square(32)],
            &ConvertOptions::default(),
        )
        .unwrap();

        assert_eq!(report.sizes, vec![IconSize::square(32)]);
        assert_eq!(report.source_dimensions, (300, 300));
        assert_eq!(report.bytes_written as u64, fs::metadata(&output).unwrap().len());

        let icon = read_icon(&output);
        let entries = icon.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!((entries[0].width(), entries[0].height()), (32, 32));
        assert_eq!(dir.file_names(), vec!["icon.ico", "source.png"]);
    }

    #[test]
    fn jpeg_input_gets_alpha_channel() {
        let dir = TempDir::new("jpeg32");
        let input = dir.path("photo.jpg");
        let output = dir.path("photo.ico");
        write_jpeg(&input, 120, 120);

        convert_to_ico(
            &input,
            &output,
            &[IconSize::square(32)],
            &ConvertOptions::default(),
        )
        .unwrap();

        let icon = read_icon(&output);
        let entries = icon.entries();
        assert_eq!(entries.len(), 1);
        let decoded = entries[0].decode().unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 32));
        assert!(decoded.rgba_data().chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn two_sizes_round_trip() {
        let dir = TempDir::new("two-sizes");
        let input = dir.path("source.png");
        let output = dir.path("icon.ico");
        write_png(&input, 100, 100);

        let sizes = [IconSize::square(16), IconSize::square(256)];
        convert_to_ico(&input, &output, &sizes, &ConvertOptions::default()).unwrap();

        let icon = read_icon(&output);
        let entries = icon.entries();
        assert_eq!(entries.len(), 2);
        for (entry, size) in entries.iter().zip(sizes) {
            assert_eq!((entry.width(), entry.height()), (size.width, size.height));
            let decoded = entry.decode().unwrap();
            assert_eq!((decoded.width(), decoded.height()), (size.width, size.height));
        }

        // image's ICO decoder picks the largest entry
        let best = image::open(&output).unwrap();
        assert_eq!((best.width(), best.height()), (256, 256));
    }

    #[test]
    fn canonical_sizes_round_trip() {
        let dir = TempDir::new("canonical");
        let input = dir.path("source.png");
        let output = dir.path("icon.ico");
        write_png(&input, 64, 64);

        let sizes: Vec<IconSize> = crate::sizes::CANONICAL_SIZES
            .iter()
            .copied()
            .map(IconSize::square)
            .collect();
        convert_to_ico(&input, &output, &sizes, &ConvertOptions::default()).unwrap();

        let icon = read_icon(&output);
        let entries = icon.entries();
        let dims: Vec<(u32, u32)> = entries.iter().map(|e| (e.width(), e.height())).collect();
        let expected: Vec<(u32, u32)> = sizes.iter().map(|s| (s.width, s.height)).collect();
        assert_eq!(dims, expected);
    }

    #[test]
    fn non_square_source_is_padded_transparent() {
        let dir = TempDir::new("wide");
        let input = dir.path("wide.png");
        let output = dir.path("wide.ico");
        RgbaImage::from_pixel(64, 32, Rgba([255, 0, 0, 255]))
            .save(&input)
            .unwrap();

        convert_to_ico(
            &input,
            &output,
            &[IconSize::square(32)],
            &ConvertOptions::default(),
        )
        .unwrap();

        let decoded = read_icon(&output).entries()[0].decode().unwrap();
        let alpha = |x: u32, y: u32| decoded.rgba_data()[((y * 32 + x) * 4 + 3) as usize];
        assert_eq!(alpha(16, 0), 0);
        assert_eq!(alpha(16, 31), 0);
        assert!(alpha(16, 16) > 250);
    }

    #[test]
    fn duplicate_sizes_collapse() {
        let dir = TempDir::new("dupes");
        let input = dir.path("source.png");
        let output = dir.path("icon.ico");
        write_png(&input, 48, 48);

        let report = convert_to_ico(
            &input,
            &output,
            &[IconSize::square(48), IconSize::square(16), IconSize::square(48)],
            &ConvertOptions::default(),
        )
        .unwrap();

        assert_eq!(report.sizes, vec![IconSize::square(48), IconSize::square(16)]);
        assert_eq!(read_icon(&output).entries().len(), 2);
    }

    #[test]
    fn corrupt_input_creates_nothing() {
        let dir = TempDir::new("corrupt");
        let input = dir.path("broken.png");
        let output = dir.path("broken.ico");
        fs::write(&input, b"definitely not a png").unwrap();

        let err = convert_to_ico(
            &input,
            &output,
            &[IconSize::square(32)],
            &ConvertOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Convert(ConvertError::Decode { .. })));
        assert!(!output.exists());
        assert_eq!(dir.file_names(), vec!["broken.png"]);
    }

    #[test]
    fn failed_conversion_keeps_existing_output() {
        let dir = TempDir::new("keep");
        let input = dir.path("broken.jpg");
        let output = dir.path("existing.ico");
        fs::write(&input, [0xFF, 0xD8, 0xFF, 0x00, 0x01]).unwrap();
        fs::write(&output, b"previous icon").unwrap();

        let result = convert_to_ico(
            &input,
            &output,
            &[IconSize::square(16)],
            &ConvertOptions::default(),
        );

        assert!(result.is_err());
        assert_eq!(fs::read(&output).unwrap(), b"previous icon");
        assert_eq!(dir.file_names(), vec!["broken.jpg", "existing.ico"]);
    }

    #[test]
    fn missing_input_is_open_error() {
        let dir = TempDir::new("missing");
        let err = convert_to_ico(
            &dir.path("nope.png"),
            &dir.path("out.ico"),
            &[IconSize::square(16)],
            &ConvertOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Convert(ConvertError::Open { .. })));
        assert!(dir.file_names().is_empty());
    }

    #[test]
    fn unwritable_destination_is_write_error() {
        let dir = TempDir::new("unwritable");
        let input = dir.path("source.png");
        write_png(&input, 32, 32);
        let output = dir.path("no-such-dir").join("icon.ico");

        let err = convert_to_ico(
            &input,
            &output,
            &[IconSize::square(16)],
            &ConvertOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Convert(ConvertError::Write { .. })));
        assert!(!output.exists());
    }

    #[test]
    fn empty_or_oversized_sizes_are_validation_errors() {
        let dir = TempDir::new("validation");
        let input = dir.path("source.png");
        let output = dir.path("icon.ico");
        write_png(&input, 32, 32);

        let err = convert_to_ico(&input, &output, &[], &ConvertOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::NoSizeSelected)
        ));

        let err = convert_to_ico(
            &input,
            &output,
            &[IconSize::square(512)],
            &ConvertOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::SizeOutOfRange(512))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn render_frame_matches_requested_size() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(10, 40));
        let frame = render_frame(&image, IconSize::square(48), FilterType::Triangle);
        assert_eq!(frame.dimensions(), (48, 48));
    }
}

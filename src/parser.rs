//! SEMI G85 wafer map parser: normalize, validate, extract, register bins, grid.

use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use crate::config::ParseConfig;
use crate::error::{Result, WaferMapError};
use crate::reader::{normalize, read_document, read_from, XmlElement};
use crate::types::*;

// ── Stages ──────────────────────────────────────────────────────────

/// Declared `FormatRevision` and whether the allow-list accepts it.
///
/// Never fails: an unsupported or missing revision is only recorded.
pub fn check_format(map: &XmlElement, config: &ParseConfig) -> (Option<String>, bool) {
    let revision = map.attr("FormatRevision").map(str::to_string);
    let is_valid = config.is_supported(revision.as_deref());
    debug!(revision = ?revision, is_valid, "format revision checked");
    if !is_valid {
        warn!(revision = ?revision, "unsupported format revision");
    }
    (revision, is_valid)
}

fn device(map: &XmlElement) -> Result<&XmlElement> {
    map.child("Device")
        .ok_or(WaferMapError::MissingRequiredDeviceBlock)
}

fn non_negative(value: Option<f64>, field: &'static str) -> Result<Option<f64>> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(WaferMapError::InvalidNumber {
            field,
            value: v.to_string(),
        }),
        other => Ok(other),
    }
}

/// Wafer and device metadata with the documented defaults applied.
pub fn extract_attributes(map: &XmlElement, config: &ParseConfig) -> Result<DeviceAttributes> {
    let device = device(map)?;

    let wafer_size = non_negative(device.parse_attr("WaferSize")?, "WaferSize")?
        .unwrap_or(config.default_wafer_size);

    let size_x = non_negative(device.parse_attr("DeviceSizeX")?, "DeviceSizeX")?;
    let size_y = non_negative(device.parse_attr("DeviceSizeY")?, "DeviceSizeY")?;
    let chip_size = match (size_x, size_y) {
        (Some(width), Some(height)) => ChipSize::Explicit { width, height },
        _ => ChipSize::Unspecified,
    };

    // CreateDate lives on Device in some writers and on Device/Data in others
    let created = device
        .attr("CreateDate")
        .or_else(|| device.child("Data").and_then(|d| d.attr("CreateDate")))
        .map(str::to_string);

    let owned = |key: &str| device.attr(key).map(str::to_string);
    let rows: u32 = device.parse_attr("Rows")?.unwrap_or(1);
    let cols: u32 = device.parse_attr("Columns")?.unwrap_or(1);
    debug!(rows, cols, wafer_size, ?chip_size, "device attributes extracted");

    Ok(DeviceAttributes {
        wafer_id: map.attr("WaferId").map(str::to_string),
        lot_id: owned("LotId"),
        wafer_size,
        chip_size,
        product_id: owned("ProductId"),
        created,
        rows,
        cols,
    })
}

fn required<'a>(
    el: &'a XmlElement,
    element: &'static str,
    field: &'static str,
) -> Result<&'a str> {
    el.attr(field)
        .ok_or(WaferMapError::MissingRequiredField { element, field })
}

/// Declared `NullBin` code and the bin registry.
///
/// Bins keep document order. The null bin is appended with a `NULL`
/// description when no `Bin` element declares it.
pub fn build_bin_registry(map: &XmlElement) -> Result<(String, BinRegistry)> {
    let device = device(map)?;
    let null_bin = required(device, "Device", "NullBin")?.to_string();

    let mut registry = BinRegistry::new();
    for (ordinal, bin) in device.children_named("Bin").enumerate() {
        let code = required(bin, "Bin", "BinCode")?;
        let quality = required(bin, "Bin", "BinQuality")?;
        let count = required(bin, "Bin", "BinCount")?;

        let def = BinDefinition {
            status: status_from_quality(quality),
            description: Some(
                bin.attr("BinDescription")
                    .map_or_else(|| ordinal.to_string(), str::to_string),
            ),
            count: Some(count.to_string()),
        };
        if registry.insert(code.to_string(), def).is_some() {
            warn!(code, "duplicate bin code declaration, keeping the later one");
        }
    }

    if !registry.contains(&null_bin) {
        registry.insert(null_bin.clone(), BinDefinition::injected_null());
    }

    debug!(bins = registry.len(), null_bin = %null_bin, "bin registry built");
    Ok((null_bin, registry))
}

/// Normalized (xstep, ystep) for the grid; ystep is negative.
///
/// With `xmax = width * cols` the step `width / xmax` reduces to `1 / cols`,
/// so the steps do not depend on the die size, only on the grid shape.
pub fn grid_steps(attrs: &DeviceAttributes) -> Result<(f64, f64)> {
    if attrs.rows == 0 || attrs.cols == 0 {
        return Err(WaferMapError::InvalidGeometry {
            rows: attrs.rows,
            cols: attrs.cols,
        });
    }
    Ok((1.0 / f64::from(attrs.cols), -1.0 / f64::from(attrs.rows)))
}

/// Emit one pixel per fixed-width token, rows top to bottom.
///
/// Trailing characters shorter than `token_width` are dropped. A token
/// missing from the registry aborts with `UnknownBinCode`.
pub fn generate_pixels<S: AsRef<str>>(
    rows: &[S],
    token_width: usize,
    attrs: &DeviceAttributes,
    registry: &BinRegistry,
) -> Result<Vec<Pixel>> {
    let (xstep, ystep) = grid_steps(attrs)?;
    let rows_f = f64::from(attrs.rows);
    let cols_f = f64::from(attrs.cols);
    let mut pixels = Vec::new();

    for (r, row) in rows.iter().enumerate() {
        let chars: Vec<char> = row.as_ref().chars().collect();
        let tokens = chars.chunks_exact(token_width);
        if !tokens.remainder().is_empty() {
            warn!(
                row = r,
                dropped = tokens.remainder().len(),
                "row length is not a multiple of the token width"
            );
        }

        // bottom edge of row r; exactly 0.0 for the last declared row
        let y = (rows_f - (r + 1) as f64) / rows_f;
        for (c, token) in tokens.enumerate() {
            let code: String = token.iter().collect();
            let Some(def) = registry.get(&code) else {
                return Err(WaferMapError::UnknownBinCode {
                    code,
                    row: r as u32,
                    col: c as u32,
                });
            };
            pixels.push(Pixel {
                origin: (c as f64 / cols_f, y),
                size: (xstep, -ystep),
                status: def.status,
                description: def.description.clone(),
                code,
                row: r as u32,
                col: c as u32,
            });
        }
    }

    Ok(pixels)
}

// ── Main parse functions ────────────────────────────────────────────

/// Run every stage over an already normalized `Map` element.
pub fn build_model(map: &XmlElement, config: &ParseConfig) -> Result<WaferMapModel> {
    let (format_revision, is_valid) = check_format(map, config);
    let device_attributes = extract_attributes(map, config)?;
    let (null_bin, bin_registry) = build_bin_registry(map)?;

    let device = device(map)?;
    let bin_type = BinType::from_attr(device.attr("BinType"));
    let data = device
        .child("Data")
        .ok_or(WaferMapError::MissingRequiredField {
            element: "Device",
            field: "Data",
        })?;
    let rows: Vec<&str> = data.children_named("Row").map(|r| r.text.as_str()).collect();

    if rows.len() != device_attributes.rows as usize {
        warn!(
            declared = device_attributes.rows,
            found = rows.len(),
            "row count differs from declared Rows"
        );
    }

    let die_size = device_attributes.chip_size.resolve(
        device_attributes.wafer_size,
        device_attributes.rows,
        device_attributes.cols,
    );
    let pixels = generate_pixels(
        rows.as_slice(),
        bin_type.token_width(),
        &device_attributes,
        &bin_registry,
    )?;

    let expected = device_attributes.rows as usize * device_attributes.cols as usize;
    if pixels.len() != expected {
        warn!(expected, found = pixels.len(), "pixel count differs from declared grid");
    }
    debug!(
        rows = device_attributes.rows,
        cols = device_attributes.cols,
        pixels = pixels.len(),
        "wafer map generated"
    );

    Ok(WaferMapModel {
        format_revision,
        is_valid,
        device_attributes,
        bin_type,
        null_bin,
        bin_registry,
        die_size,
        pixels,
    })
}

/// Parse a wafer map held in memory.
pub fn parse_wafer_map_str(xml: &str, config: &ParseConfig) -> Result<WaferMapModel> {
    let map = normalize(xml)?;
    build_model(&map, config)
}

/// Parse a wafer map from any reader.
pub fn parse_wafer_map_reader<R: Read>(reader: R, config: &ParseConfig) -> Result<WaferMapModel> {
    let xml = read_from(reader)?;
    parse_wafer_map_str(&xml, config)
}

/// Parse a wafer map file (supports .xml and .xml.gz).
pub fn parse_wafer_map_file<P: AsRef<Path>>(path: P, config: &ParseConfig) -> Result<WaferMapModel> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading wafer map");
    let xml = read_document(path)?;
    parse_wafer_map_str(&xml, config)
}

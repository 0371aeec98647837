use crate::bio::sequence::AlignedSequence;
use crate::CaduceusError;
use flate2::read::GzDecoder;
use memmap2::Mmap;
use nom::{
    bytes::complete::{tag, take_till},
    character::complete::{line_ending, not_line_ending},
    combinator::{map, opt},
    IResult,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Parse a FASTA header line. The whole line after `>` is the raw
/// identifier; segment headers carry strain names with embedded spaces and
/// punctuation, so nothing is split off here.
fn parse_header(input: &[u8]) -> IResult<&[u8], &str> {
    let (input, _) = tag(b">")(input)?;
    let (input, raw) = map(not_line_ending, |s| {
        std::str::from_utf8(s).unwrap_or("").trim_end()
    })(input)?;
    let (input, _) = opt(line_ending)(input)?;
    Ok((input, raw))
}

/// Parse sequence lines until the next header or EOF.
///
/// Gap columns (`-`) are alignment content and must survive parsing; only
/// whitespace is stripped. Residues are uppercased.
fn parse_residues(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    let mut residues = Vec::new();
    let mut remaining = input;

    while !remaining.is_empty() && remaining[0] != b'>' {
        let (rest, line) =
            take_till::<_, _, nom::error::Error<_>>(|c: u8| c == b'\n' || c == b'\r')(remaining)?;
        let (rest, _) = opt(line_ending)(rest)?;

        for &c in line {
            if !c.is_ascii_whitespace() {
                residues.push(c.to_ascii_uppercase());
            }
        }

        remaining = rest;
    }

    Ok((remaining, residues))
}

/// Parse aligned FASTA records from a byte buffer.
///
/// A header with an empty body is malformed input, not a record to skip:
/// every error names the offending header so the run can be traced back to
/// the source file.
pub fn parse_fasta_from_bytes(data: &[u8]) -> Result<Vec<AlignedSequence>, CaduceusError> {
    let mut remaining = data;
    let mut sequences = Vec::new();

    while !remaining.is_empty() {
        while !remaining.is_empty() && remaining[0].is_ascii_whitespace() {
            remaining = &remaining[1..];
        }
        if remaining.is_empty() {
            break;
        }
        if remaining[0] != b'>' {
            return Err(CaduceusError::Parse(format!(
                "expected '>' at record start, found '{}'",
                remaining[0] as char
            )));
        }

        let (rest, raw_id) = parse_header(remaining)
            .map_err(|_| CaduceusError::Parse("failed to parse FASTA header".to_string()))?;
        let (rest, residues) = parse_residues(rest).map_err(|_| {
            CaduceusError::Parse(format!("failed to parse sequence for '{}'", raw_id))
        })?;

        if raw_id.is_empty() {
            return Err(CaduceusError::Parse(
                "record with empty header".to_string(),
            ));
        }
        if residues.is_empty() {
            return Err(CaduceusError::Parse(format!(
                "record '{}' has no residues",
                raw_id
            )));
        }

        sequences.push(AlignedSequence::new(raw_id.to_string(), residues));
        remaining = rest;
    }

    Ok(sequences)
}

/// Parse an aligned FASTA file (supports .gz compression).
pub fn parse_fasta<P: AsRef<Path>>(path: P) -> Result<Vec<AlignedSequence>, CaduceusError> {
    let path = path.as_ref();

    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        parse_fasta_gzip(path)
    } else {
        parse_fasta_uncompressed(path)
    }
}

fn parse_fasta_uncompressed(path: &Path) -> Result<Vec<AlignedSequence>, CaduceusError> {
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };

    parse_fasta_from_bytes(&mmap[..])
}

fn parse_fasta_gzip(path: &Path) -> Result<Vec<AlignedSequence>, CaduceusError> {
    let file = File::open(path)?;
    let mut decoder = GzDecoder::new(BufReader::new(file));
    let mut buffer = Vec::new();
    decoder.read_to_end(&mut buffer)?;

    parse_fasta_from_bytes(&buffer)
}

/// Write sequences to a FASTA file (supports .gz compression).
pub fn write_fasta<P: AsRef<Path>>(
    path: P,
    sequences: &[AlignedSequence],
) -> Result<(), CaduceusError> {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let path = path.as_ref();
    let file = File::create(path)?;

    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        let encoder = GzEncoder::new(file, Compression::default());
        let mut writer = BufWriter::new(encoder);
        write_fasta_to_writer(&mut writer, sequences)?;
        writer.flush()?;
    } else {
        let mut writer = BufWriter::new(file);
        write_fasta_to_writer(&mut writer, sequences)?;
        writer.flush()?;
    }

    Ok(())
}

fn write_fasta_to_writer<W: Write>(
    writer: &mut W,
    sequences: &[AlignedSequence],
) -> Result<(), CaduceusError> {
    for seq in sequences {
        writeln!(writer, ">{}", seq.raw_id)?;
        for chunk in seq.residues.chunks(80) {
            writeln!(writer, "{}", String::from_utf8_lossy(chunk))?;
        }
    }
    Ok(())
}

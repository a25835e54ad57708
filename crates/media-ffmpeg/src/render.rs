use crate::error::{MediaFfmpegError, Result};
use crate::expr::CropX;
use crate::format::{format_decimal, format_seconds, shell_quote};

const PROGRAM: &str = "ffmpeg";
const CONCAT_VIDEO_LABEL: &str = "[outv]";
const CONCAT_AUDIO_LABEL: &str = "[outa]";

/// How the per-segment units are joined into the output streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assembly {
    /// All segments feed one `concat` filter, even when there is only one.
    Concat,
    /// Exactly one segment mapped straight to the outputs.
    Single,
}

/// Codec and overwrite options written into the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoding {
    pub video_codec: String,
    pub audio_codec: String,
    pub overwrite: bool,
}

impl Default for Encoding {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            overwrite: true,
        }
    }
}

/// One source range to trim, crop and scale.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSegment {
    pub start: f64,
    pub end: f64,
    pub crop_width: f64,
    pub crop_height: f64,
    pub crop_x: CropX,
}

/// Request payload for one output file.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub input: String,
    pub segments: Vec<RenderSegment>,
    pub output_width: u32,
    pub output_height: u32,
    pub assembly: Assembly,
    pub encoding: Encoding,
    pub output_path: String,
}

/// A synthesized FFmpeg invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegCommand {
    pub input: String,
    pub filter_complex: String,
    pub maps: Vec<String>,
    pub video_codec: String,
    pub audio_codec: String,
    pub overwrite: bool,
    pub output: String,
}

impl FfmpegCommand {
    /// Returns the argument vector, without the program name.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(12 + self.maps.len() * 2);
        if self.overwrite {
            args.push("-y".to_string());
        }
        args.push("-i".to_string());
        args.push(self.input.clone());
        args.push("-filter_complex".to_string());
        args.push(self.filter_complex.clone());
        for map in &self.maps {
            args.push("-map".to_string());
            args.push(map.clone());
        }
        args.push("-c:v".to_string());
        args.push(self.video_codec.clone());
        args.push("-c:a".to_string());
        args.push(self.audio_codec.clone());
        args.push(self.output.clone());
        args
    }

    /// Renders a single shell line that can be pasted into a terminal or script.
    pub fn to_shell(&self) -> String {
        let mut line = String::from(PROGRAM);
        if self.overwrite {
            line.push_str(" -y");
        }
        line.push_str(" -i ");
        line.push_str(&shell_quote(&self.input));
        line.push_str(" -filter_complex \"");
        line.push_str(&self.filter_complex);
        line.push('"');
        for map in &self.maps {
            line.push_str(" -map \"");
            line.push_str(map);
            line.push('"');
        }
        line.push_str(" -c:v ");
        line.push_str(&shell_word(&self.video_codec));
        line.push_str(" -c:a ");
        line.push_str(&shell_word(&self.audio_codec));
        line.push(' ');
        line.push_str(&shell_quote(&self.output));
        line
    }
}

/// Validates `request` and builds the command that renders it.
pub fn build_render_command(request: &RenderRequest) -> Result<FfmpegCommand> {
    validate_request(request)?;
    let maps = match request.assembly {
        Assembly::Concat => vec![
            CONCAT_VIDEO_LABEL.to_string(),
            CONCAT_AUDIO_LABEL.to_string(),
        ],
        Assembly::Single => vec!["[v0]".to_string(), "[a0]".to_string()],
    };

    Ok(FfmpegCommand {
        input: request.input.clone(),
        filter_complex: build_filter_complex(request),
        maps,
        video_codec: request.encoding.video_codec.clone(),
        audio_codec: request.encoding.audio_codec.clone(),
        overwrite: request.encoding.overwrite,
        output: request.output_path.clone(),
    })
}

/// Builds the `-filter_complex` graph: one trim/crop/scale unit per segment,
/// followed by a concat stage for [`Assembly::Concat`].
pub fn build_filter_complex(request: &RenderRequest) -> String {
    let mut chains = Vec::<String>::with_capacity(request.segments.len() * 2 + 1);
    for (index, segment) in request.segments.iter().enumerate() {
        let start = format_seconds(segment.start);
        let end = format_seconds(segment.end);
        chains.push(format!(
            "[0:v]trim=start={start}:end={end},setpts=PTS-STARTPTS,crop={}:{}:{}:0,scale={}:{}[v{index}]",
            format_decimal(segment.crop_width),
            format_decimal(segment.crop_height),
            segment.crop_x.expression(),
            request.output_width,
            request.output_height,
        ));
        chains.push(format!(
            "[0:a]atrim=start={start}:end={end},asetpts=PTS-STARTPTS[a{index}]"
        ));
    }

    if request.assembly == Assembly::Concat {
        let mut concat_inputs = String::new();
        for index in 0..request.segments.len() {
            concat_inputs.push_str(&format!("[v{index}][a{index}]"));
        }
        chains.push(format!(
            "{concat_inputs}concat=n={}:v=1:a=1{CONCAT_VIDEO_LABEL}{CONCAT_AUDIO_LABEL}",
            request.segments.len()
        ));
    }

    chains.join(";")
}

fn validate_request(request: &RenderRequest) -> Result<()> {
    if request.input.trim().is_empty() {
        return Err(MediaFfmpegError::InvalidRenderRequest {
            reason: "input name is empty",
        });
    }
    if request.output_path.trim().is_empty() {
        return Err(MediaFfmpegError::InvalidRenderRequest {
            reason: "output path is empty",
        });
    }
    if request.segments.is_empty() {
        return Err(MediaFfmpegError::InvalidRenderRequest {
            reason: "render segments are empty",
        });
    }
    if request.assembly == Assembly::Single && request.segments.len() != 1 {
        return Err(MediaFfmpegError::InvalidRenderRequest {
            reason: "single assembly requires exactly one segment",
        });
    }
    if request.output_width == 0 || request.output_height == 0 {
        return Err(MediaFfmpegError::InvalidRenderRequest {
            reason: "output dimensions must be positive",
        });
    }
    if request.encoding.video_codec.trim().is_empty()
        || request.encoding.audio_codec.trim().is_empty()
    {
        return Err(MediaFfmpegError::InvalidRenderRequest {
            reason: "codec names must not be empty",
        });
    }

    for (index, segment) in request.segments.iter().enumerate() {
        ensure_finite(segment.start, "segment start")?;
        ensure_finite(segment.end, "segment end")?;
        if segment.start < 0.0 || segment.end <= segment.start {
            return Err(MediaFfmpegError::InvalidSegmentRange {
                index,
                start: segment.start,
                end: segment.end,
            });
        }
        ensure_finite(segment.crop_width, "crop width")?;
        ensure_finite(segment.crop_height, "crop height")?;
        if segment.crop_width <= 0.0 || segment.crop_height <= 0.0 {
            return Err(MediaFfmpegError::InvalidRenderRequest {
                reason: "crop window must be positive",
            });
        }
        match segment.crop_x {
            CropX::Fixed(x) => ensure_finite(x, "crop x")?,
            CropX::Pan {
                from, to, duration, ..
            } => {
                ensure_finite(from, "pan start x")?;
                ensure_finite(to, "pan end x")?;
                ensure_finite(duration, "pan duration")?;
                if duration <= 0.0 {
                    return Err(MediaFfmpegError::InvalidRenderRequest {
                        reason: "pan duration must be positive",
                    });
                }
            }
        }
    }

    Ok(())
}

fn ensure_finite(value: f64, context: &'static str) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(MediaFfmpegError::NonFiniteValue { context, value })
    }
}

fn shell_word(value: &str) -> String {
    let safe = value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.' | ':' | '+'));
    if safe && !value.is_empty() {
        value.to_string()
    } else {
        shell_quote(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Assembly, Encoding, RenderRequest, RenderSegment, build_filter_complex,
        build_render_command, validate_request,
    };
    use crate::{CropX, MediaFfmpegError, PanEasing};

    fn segment(start: f64, end: f64, crop_x: CropX) -> RenderSegment {
        RenderSegment {
            start,
            end,
            crop_width: 607.5,
            crop_height: 1080.0,
            crop_x,
        }
    }

    fn request(segments: Vec<RenderSegment>, assembly: Assembly) -> RenderRequest {
        RenderRequest {
            input: "in.mp4".to_string(),
            segments,
            output_width: 720,
            output_height: 1280,
            assembly,
            encoding: Encoding::default(),
            output_path: "out.mp4".to_string(),
        }
    }

    #[test]
    fn build_filter_complex_for_two_segments_uses_trim_crop_scale_and_concat() {
        let request = request(
            vec![
                segment(0.0, 5.0, CropX::Fixed(656.25)),
                segment(5.0, 9.5, CropX::Fixed(131.25)),
            ],
            Assembly::Concat,
        );

        let filter = build_filter_complex(&request);
        assert_eq!(
            filter,
            "[0:v]trim=start=0.00:end=5.00,setpts=PTS-STARTPTS,crop=607.5:1080:656.25:0,scale=720:1280[v0];\
[0:a]atrim=start=0.00:end=5.00,asetpts=PTS-STARTPTS[a0];\
[0:v]trim=start=5.00:end=9.50,setpts=PTS-STARTPTS,crop=607.5:1080:131.25:0,scale=720:1280[v1];\
[0:a]atrim=start=5.00:end=9.50,asetpts=PTS-STARTPTS[a1];\
[v0][a0][v1][a1]concat=n=2:v=1:a=1[outv][outa]"
        );
    }

    #[test]
    fn single_assembly_maps_first_unit_without_concat() {
        let request = request(
            vec![segment(
                2.0,
                6.0,
                CropX::Pan {
                    from: 262.5,
                    to: 1050.0,
                    duration: 4.0,
                    easing: PanEasing::Linear,
                },
            )],
            Assembly::Single,
        );

        let command = build_render_command(&request).expect("command should build");
        assert!(!command.filter_complex.contains("concat"));
        assert_eq!(command.maps, vec!["[v0]".to_string(), "[a0]".to_string()]);
        assert_eq!(
            command.to_shell(),
            "ffmpeg -y -i 'in.mp4' -filter_complex \"\
[0:v]trim=start=2.00:end=6.00,setpts=PTS-STARTPTS,crop=607.5:1080:'262.5+(1050-262.5)*(t/4.00)':0,scale=720:1280[v0];\
[0:a]atrim=start=2.00:end=6.00,asetpts=PTS-STARTPTS[a0]\" \
-map \"[v0]\" -map \"[a0]\" -c:v libx264 -c:a aac 'out.mp4'"
        );
    }

    #[test]
    fn concat_of_one_segment_still_uses_concat_filter() {
        let request = request(vec![segment(0.0, 1.0, CropX::Fixed(0.0))], Assembly::Concat);
        let filter = build_filter_complex(&request);
        assert!(filter.ends_with("[v0][a0]concat=n=1:v=1:a=1[outv][outa]"));
    }

    #[test]
    fn to_args_omits_overwrite_flag_when_disabled() {
        let mut request = request(vec![segment(0.0, 1.0, CropX::Fixed(0.0))], Assembly::Concat);
        request.encoding.overwrite = false;
        let args = build_render_command(&request)
            .expect("command should build")
            .to_args();
        assert_eq!(args[0], "-i");
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
        assert!(args.iter().any(|arg| arg == "[outa]"));
    }

    #[test]
    fn validate_request_rejects_inverted_segment_range() {
        let request = request(vec![segment(4.0, 4.0, CropX::Fixed(0.0))], Assembly::Concat);
        assert!(matches!(
            validate_request(&request),
            Err(MediaFfmpegError::InvalidSegmentRange { index: 0, .. })
        ));
    }

    #[test]
    fn validate_request_rejects_single_assembly_with_many_segments() {
        let request = request(
            vec![
                segment(0.0, 1.0, CropX::Fixed(0.0)),
                segment(1.0, 2.0, CropX::Fixed(0.0)),
            ],
            Assembly::Single,
        );
        assert!(matches!(
            validate_request(&request),
            Err(MediaFfmpegError::InvalidRenderRequest {
                reason: "single assembly requires exactly one segment"
            })
        ));
    }

    #[test]
    fn codec_names_with_spaces_are_quoted() {
        let mut request = request(vec![segment(0.0, 1.0, CropX::Fixed(0.0))], Assembly::Concat);
        request.encoding.video_codec = "lib x264".to_string();
        let shell = build_render_command(&request)
            .expect("command should build")
            .to_shell();
        assert!(shell.contains("-c:v 'lib x264'"));
    }
}

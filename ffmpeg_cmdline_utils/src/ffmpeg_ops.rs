use std::{
    ffi::OsStr,
    io::prelude::*,
    path::{Path, PathBuf},
    process::{Child, ChildStdout, Command, Stdio},
    time::{Duration, Instant},
};

#[cfg(target_family = "windows")]
use std::os::windows::process::CommandExt;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use image::GrayImage;
use log::debug;
use wait_timeout::ChildExt;
use FfmpegCommandName::*;
use FfmpegError::*;

use crate::*;

const FFPROBE_TIMEOUT_SECS: u64 = 60;

// Decoded frames waiting to be consumed. Keeps ffmpeg from running far ahead of the caller.
const FRAME_QUEUE_LEN: usize = 4;

type RawFrame = Result<Vec<u8>, FfmpegError>;

/// An iterator over the sampled frames of a video, as produced by a running ffmpeg process.
///
/// When the iterator returns `None` the stream is over, either because ffmpeg reached the end
/// of the video or because something went wrong. Call [`FfmpegFrameIterGray::finish`] to find
/// out which.
///
/// ffmpeg's stdout is drained on a separate thread, so the timeout fires even if ffmpeg stops
/// producing output altogether.
#[derive(Debug)]
pub struct FfmpegFrameIterGray {
    x: u32,
    y: u32,
    child: Child,
    frames_rx: Receiver<RawFrame>,
    frames_read: u32,
    deadline: Option<(Instant, u64)>,
    finished: bool,
    failure: Option<FfmpegError>,
}

impl FfmpegFrameIterGray {
    // Takes ownership of a child that writes raw `x * y` byte frames to its stdout.
    fn from_child(
        mut child: Child,
        (x, y): (u32, u32),
        timeout_secs: Option<u64>,
    ) -> Result<Self, FfmpegError> {
        let frame_size = usize::try_from(u64::from(x) * u64::from(y))
            .map_err(|_| InvalidResolution)?;

        let Some(stdout) = child.stdout.take() else {
            let _kill_error = child.kill();
            let _wait_error = child.wait();
            return Err(Io("ffmpeg stdout is unavailable".to_string()));
        };

        let (frames_tx, frames_rx) = crossbeam_channel::bounded(FRAME_QUEUE_LEN);
        std::thread::spawn(move || read_frames(stdout, frame_size, &frames_tx));

        Ok(Self {
            x,
            y,
            child,
            frames_rx,
            frames_read: 0,
            deadline: timeout_secs.map(|secs| (Instant::now() + Duration::from_secs(secs), secs)),
            finished: false,
            failure: None,
        })
    }

    /// Number of complete frames returned so far.
    pub fn frames_read(&self) -> u32 {
        self.frames_read
    }

    /// The dimensions of every frame returned by this iterator.
    pub fn frame_dimensions(&self) -> (u32, u32) {
        (self.x, self.y)
    }

    /// Reap the ffmpeg process and report whether the stream ended cleanly.
    ///
    /// If the caller stops iterating before the end of the stream then ffmpeg is killed and
    /// this is not treated as an error.
    ///
    /// # Errors
    /// * Reading from ffmpeg failed, or ffmpeg did not finish before the timeout
    /// * ffmpeg exited with a nonzero exit status.
    pub fn finish(mut self) -> Result<u32, FfmpegError> {
        if let Some(failure) = self.failure.take() {
            self.kill_and_reap();
            return Err(failure);
        }

        if !self.finished {
            self.kill_and_reap();
            return Ok(self.frames_read);
        }

        let status = match self.deadline {
            Some((deadline, secs)) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                match self.child.wait_timeout(remaining) {
                    Ok(Some(status)) => status,
                    Ok(None) => {
                        self.kill_and_reap();
                        return Err(Timeout(secs));
                    }
                    Err(e) => return Err(Io(format!("{:?}", e.kind()))),
                }
            }
            None => self.child.wait().map_err(|e| Io(format!("{:?}", e.kind())))?,
        };

        if status.success() {
            Ok(self.frames_read)
        } else {
            Err(FfmpegInternal(format!("ffmpeg exited with {status}")))
        }
    }

    fn fail(&mut self, failure: FfmpegError) {
        self.finished = true;
        self.failure = Some(failure);
    }

    // Killing the child also closes its stdout, which stops the reader thread.
    fn kill_and_reap(&mut self) {
        let _kill_error = self.child.kill();
        let _wait_error = self.child.wait();
    }
}

impl Iterator for FfmpegFrameIterGray {
    type Item = GrayImage;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let received = match self.deadline {
            Some((deadline, secs)) => match self.frames_rx.recv_deadline(deadline) {
                Ok(raw_frame) => Some(raw_frame),
                Err(RecvTimeoutError::Timeout) => {
                    self.fail(Timeout(secs));
                    return None;
                }
                Err(RecvTimeoutError::Disconnected) => None,
            },
            None => self.frames_rx.recv().ok(),
        };

        match received {
            // the reader thread hung up: end of stream.
            None => {
                self.finished = true;
                None
            }
            Some(Err(e)) => {
                self.fail(e);
                None
            }
            Some(Ok(raw_buf)) => {
                self.frames_read += 1;
                GrayImage::from_raw(self.x, self.y, raw_buf)
            }
        }
    }
}

// to prevent accumulation of zombie processes, reap the return code of
// ffmpeg subcommands (if nothing else has done so already) here
impl Drop for FfmpegFrameIterGray {
    fn drop(&mut self) {
        self.kill_and_reap();
    }
}

// Split the stream into frames until it ends or nobody is listening any more.
fn read_frames(mut stdout: ChildStdout, frame_size: usize, frames_tx: &Sender<RawFrame>) {
    loop {
        let mut raw_buf = vec![0u8; frame_size];
        let mut buf_head = 0;

        while buf_head < frame_size {
            match stdout.read(&mut raw_buf[buf_head..]) {
                // end of stream. A partially written frame is discarded.
                Ok(0) => {
                    if buf_head != 0 {
                        debug!("discarding truncated frame ({buf_head} of {frame_size} bytes)");
                    }
                    return;
                }
                Ok(bytes_read) => buf_head += bytes_read,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => (),
                Err(e) => {
                    let _send_error = frames_tx.send(Err(Io(format!("{:?}", e.kind()))));
                    return;
                }
            }
        }

        if frames_tx.send(Ok(raw_buf)).is_err() {
            return;
        }
    }
}

/// Configures and spawns an ffmpeg process which samples frames from a video at a fixed
/// rate, downscales them and writes them to a pipe as raw grayscale buffers.
#[derive(Clone, Debug)]
pub struct FfmpegFrameReaderBuilder {
    src_path: PathBuf,
    fps: Option<f64>,
    max_dimension: Option<u32>,
    timeout_secs: Option<u64>,
}

impl FfmpegFrameReaderBuilder {
    pub fn new(src_path: impl AsRef<Path>) -> Self {
        Self {
            src_path: src_path.as_ref().to_path_buf(),
            fps: None,
            max_dimension: None,
            timeout_secs: None,
        }
    }

    pub fn src_path(&self) -> &Path {
        &self.src_path
    }

    /// Sample the video at this many frames per second. If unset every frame is returned.
    pub fn fps(&mut self, fps: f64) -> &mut Self {
        self.fps = Some(fps);
        self
    }

    /// Downscale frames so that neither dimension exceeds `max_dimension`, preserving the aspect
    /// ratio. Frames are never upscaled.
    pub fn max_dimension(&mut self, max_dimension: u32) -> &mut Self {
        self.max_dimension = Some(max_dimension);
        self
    }

    pub fn timeout_secs(&mut self, timeout_secs: u64) -> &mut Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Start ffmpeg. Also returns the information that ffprobe reported about the video.
    ///
    /// # Errors
    /// * ffprobe could not read the file, or it has no video stream
    /// * ffmpeg could not be started
    pub fn spawn_gray(&self) -> Result<(FfmpegFrameIterGray, VideoInfo), FfmpegError> {
        //we need the resolution of the video so that stdout can be split into frames.
        let stats = VideoInfo::new(&self.src_path)?;
        let frame_iterator = self.spawn_gray_with_info(&stats)?;

        Ok((frame_iterator, stats))
    }

    /// Start ffmpeg, using information about the video that the caller already got from
    /// [`VideoInfo::new`].
    ///
    /// # Errors
    /// * The video has no video stream
    /// * ffmpeg could not be started
    pub fn spawn_gray_with_info(
        &self,
        stats: &VideoInfo,
    ) -> Result<FfmpegFrameIterGray, FfmpegError> {
        //bail out if we get invalid dimensions.
        let (x, y) = stats.resolution();
        if x == 0 || y == 0 {
            return Err(InvalidResolution);
        }

        let (out_x, out_y) = match self.max_dimension {
            Some(max_dimension) => scaled_resolution((x, y), max_dimension),
            None => (x, y),
        };

        //the scale filter always runs so that the frame size on the pipe is known exactly.
        let mut filters = vec![];
        if let Some(fps) = self.fps {
            filters.push(format!("fps={fps}"));
        }
        filters.push(format!("scale={out_x}:{out_y}"));
        let filter_string = filters.join(",");

        #[rustfmt::skip]
        let mut args = vec![
            OsStr::new("-hide_banner"),
            OsStr::new("-loglevel"), OsStr::new("error"),
            OsStr::new("-nostats"),
        ];

        //decode the same stream that ffprobe described, not whichever one ffmpeg would pick.
        #[rustfmt::skip]
        args.extend([
            OsStr::new("-i"),        OsStr::new(&self.src_path),
            OsStr::new("-map"),      OsStr::new("0:v:0"),
            OsStr::new("-vf"),       OsStr::new(&filter_string),
        ]);

        #[rustfmt::skip]
        args.extend([
            OsStr::new("-pix_fmt"),  OsStr::new("gray"),
            OsStr::new("-c:v"),      OsStr::new("rawvideo"),
            OsStr::new("-f"),        OsStr::new("image2pipe"),
            OsStr::new("-"),
        ]);

        debug!(
            "spawning ffmpeg {}",
            args.iter()
                .map(|arg| arg.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let child = spawn_ffmpeg_command(Ffmpeg, &args, true)?;

        FfmpegFrameIterGray::from_child(child, (out_x, out_y), self.timeout_secs)
    }
}

/// The size that a frame of the given resolution is scaled to so that it fits inside a
/// `max_dimension` square. The aspect ratio is preserved, frames are never upscaled, and
/// both dimensions are truncated to an even number (minimum 2).
pub fn scaled_resolution((x, y): (u32, u32), max_dimension: u32) -> (u32, u32) {
    if x == 0 || y == 0 {
        return (0, 0);
    }

    let (x_f, y_f) = (f64::from(x), f64::from(y));
    let box_x = f64::from(max_dimension.min(x));
    let box_y = f64::from(max_dimension.min(y));
    let scale = (box_x / x_f).min(box_y / y_f);

    let even = |val: f64| ((val.round() as u32) / 2 * 2).max(2);
    (even(x_f * scale), even(y_f * scale))
}

pub fn get_video_stats<P: AsRef<Path>>(src_path: P) -> Result<String, FfmpegError> {
    #[rustfmt::skip]
    let args = &[
        OsStr::new("-v"),            OsStr::new("quiet"),
        OsStr::new("-show_format"),
        OsStr::new("-show_streams"),
        OsStr::new("-print_format"), OsStr::new("json"),
        OsStr::new(src_path.as_ref()),
    ];

    let stdout = run_ffmpeg_command(Ffprobe, args, true)?.stdout;

    String::from_utf8(stdout).map_err(|_| Utf8Conversion)
}

pub fn ffmpeg_and_ffprobe_are_callable() -> bool {
    //check ffprobe is callable.
    if run_ffmpeg_command(Ffprobe, &[OsStr::new("-version")], true).is_err() {
        return false;
    }

    //now ffmpeg.
    if run_ffmpeg_command(Ffmpeg, &[OsStr::new("-version")], true).is_err() {
        return false;
    }

    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FfmpegCommandName {
    Ffprobe,
    Ffmpeg,
}

impl FfmpegCommandName {
    pub fn as_os_str(&self) -> &'static OsStr {
        match self {
            Self::Ffprobe => OsStr::new("ffprobe"),
            Self::Ffmpeg => OsStr::new("ffmpeg"),
        }
    }
}

fn spawn_ffmpeg_command(
    name: FfmpegCommandName,
    args: &[&OsStr],
    stderr_null: bool,
) -> Result<Child, FfmpegError> {
    let stderr_cfg = if stderr_null {
        Stdio::null()
    } else {
        Stdio::piped()
    };

    let mut command = Command::new(name.as_os_str());
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(stderr_cfg);

    //do not spawn a command window on windows when when in a gui application
    #[cfg(target_family = "windows")]
    command.creation_flags(winapi::um::winbase::CREATE_NO_WINDOW);

    command.spawn().map_err(|e| match e.kind() {
        //shell failed to execute the command. Separate out FileNotFound from all other errors
        //as by far the most likely cause is ffmpeg is not installed.
        std::io::ErrorKind::NotFound => FfmpegNotFound,
        _ => Io(format!("{:?}", e.kind())),
    })
}

struct FfmpegOutput {
    _stderr: Vec<u8>,
    stdout: Vec<u8>,
}

type FfmpegCmdResult = Result<FfmpegOutput, FfmpegError>;

fn run_ffmpeg_command(
    name: FfmpegCommandName,
    args: &[&OsStr],
    stderr_null: bool,
) -> FfmpegCmdResult {
    fn truncate_ffmpeg_err_msg(stderr: &[u8], status: std::process::ExitStatus) -> FfmpegError {
        match std::str::from_utf8(stderr) {
            Ok("") => FfmpegInternal(format!("exited with {status}")),
            Ok(error_text) => FfmpegInternal(error_text.chars().take(500).collect::<String>()),
            Err(_) => Utf8Conversion,
        }
    }

    fn read_pipe<R: Read>(pipe: Option<R>) -> Vec<u8> {
        let mut acc = vec![];
        if let Some(mut pipe) = pipe {
            let _read_error = pipe.read_to_end(&mut acc);
        }
        acc
    }

    let mut child = spawn_ffmpeg_command(name, args, stderr_null)?;

    //Drain stdout and stderr on their own threads so that a full pipe cannot stall the child
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let stdout_thread = std::thread::spawn(move || read_pipe(stdout));
    let stderr_thread = std::thread::spawn(move || read_pipe(stderr));

    let status = match child.wait_timeout(Duration::from_secs(FFPROBE_TIMEOUT_SECS)) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _kill_error = child.kill();
            let _wait_error = child.wait();
            return Err(Timeout(FFPROBE_TIMEOUT_SECS));
        }
        Err(e) => {
            let _kill_error = child.kill();
            let _wait_error = child.wait();
            return Err(Io(format!("{:?}", e.kind())));
        }
    };

    let stdout_acc = stdout_thread.join().unwrap_or_default();
    let stderr_acc = stderr_thread.join().unwrap_or_default();

    if status.success() {
        Ok(FfmpegOutput {
            stdout: stdout_acc,
            _stderr: stderr_acc,
        })
    } else {
        //sometimes ffmpeg creates very long error messages. Limit them to the first 500 characters
        Err(truncate_ffmpeg_err_msg(&stderr_acc, status))
    }
}

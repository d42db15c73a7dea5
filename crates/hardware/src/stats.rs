//! Controller statistics collection and reporting.
//!
//! This module tracks the performance metrics of the cached memory controller. It provides:
//! 1. **Traffic:** Read and write counts as seen at the controller's input.
//! 2. **Scheduling:** Row-buffer hits and misses, starvation precharges, write pauses.
//! 3. **Front-end cache:** Lookup attempts, hits, and mirrored writes.
//! 4. **Latency:** Running averages of service, queueing, and total latency.
//!
//! Statistic names are part of the report schema and are kept verbatim (`mem_reads`,
//! `averageLatency`, `myCacheHits`, ...), both in [`ControllerStats::register`] and in the JSON
//! report built on top of it.

/// Incrementally maintained arithmetic mean.
///
/// Each sample updates the mean as `avg' = (avg * n + sample) / (n + 1)` and then `n' = n + 1`.
/// The operation order is fixed so reports are bit-for-bit reproducible across runs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunningAverage {
    average: f64,
    count: u64,
}

impl RunningAverage {
    /// Creates an empty average.
    pub const fn new() -> Self {
        Self {
            average: 0.0,
            count: 0,
        }
    }

    /// Folds one sample into the mean.
    pub fn record(&mut self, sample: f64) {
        self.average = (self.average * self.count as f64 + sample) / (self.count + 1) as f64;
        self.count += 1;
    }

    /// Current mean (0.0 before any sample).
    #[inline]
    pub const fn average(&self) -> f64 {
        self.average
    }

    /// Number of samples recorded.
    #[inline]
    pub const fn count(&self) -> u64 {
        self.count
    }
}

/// Destination for named statistics.
///
/// The controller writes values; the sink owns naming-to-report formatting.
pub trait StatsSink {
    /// Records an integer counter.
    fn counter(&mut self, name: &'static str, value: u64);

    /// Records a floating-point average.
    fn average(&mut self, name: &'static str, value: f64);
}

/// Statistics of one cached memory controller.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControllerStats {
    /// Reads presented to the controller (cache hits included).
    pub mem_reads: u64,
    /// Writes presented to the controller.
    pub mem_writes: u64,
    /// Requests scheduled as row-buffer hits.
    pub rb_hits: u64,
    /// Requests scheduled without a row-buffer hit.
    pub rb_miss: u64,
    /// Starved requests forced ahead of row-buffer hits.
    pub starvation_precharges: u64,
    /// Reads paused behind an overlapping write.
    pub write_pauses: u64,
    /// Reads looked up in the front-end cache when issued.
    pub cache_tries: u64,
    /// Reads that hit the front-end cache when issued.
    ///
    /// Reads later dispatched from the cache by the scheduler are not counted.
    pub cache_hits: u64,
    /// Writes mirrored into the front-end cache.
    pub cache_writes: u64,
    /// Completion minus issue cycle.
    pub service_latency: RunningAverage,
    /// Issue minus arrival cycle.
    pub queue_latency: RunningAverage,
    /// Completion minus arrival cycle.
    pub total_latency: RunningAverage,
}

/// Collects registered statistics into a JSON object.
#[derive(Debug, Default)]
struct JsonSink(serde_json::Map<String, serde_json::Value>);

impl StatsSink for JsonSink {
    fn counter(&mut self, name: &'static str, value: u64) {
        let _ = self.0.insert(name.to_owned(), value.into());
    }

    fn average(&mut self, name: &'static str, value: f64) {
        let _ = self.0.insert(name.to_owned(), value.into());
    }
}

impl ControllerStats {
    /// Records the three latencies of a completed request.
    ///
    /// # Arguments
    ///
    /// * `arrival` - Cycle the request entered the controller.
    /// * `issue` - Cycle it was handed to the backing memory (or the cache).
    /// * `completion` - Cycle it completed.
    pub fn record_latencies(&mut self, arrival: u64, issue: u64, completion: u64) {
        self.service_latency.record(completion as f64 - issue as f64);
        self.queue_latency.record(issue as f64 - arrival as f64);
        self.total_latency.record(completion as f64 - arrival as f64);
    }

    /// Mean completion-minus-issue latency.
    pub const fn average_latency(&self) -> f64 {
        self.service_latency.average()
    }

    /// Mean issue-minus-arrival latency.
    pub const fn average_queue_latency(&self) -> f64 {
        self.queue_latency.average()
    }

    /// Mean completion-minus-arrival latency.
    pub const fn average_total_latency(&self) -> f64 {
        self.total_latency.average()
    }

    /// Number of service latency samples.
    pub const fn measured_latencies(&self) -> u64 {
        self.service_latency.count()
    }

    /// Front-end cache hit rate in percent (0.0 with no lookups).
    pub fn cache_hit_rate(&self) -> f64 {
        if self.cache_tries == 0 {
            0.0
        } else {
            100.0 * self.cache_hits as f64 / self.cache_tries as f64
        }
    }

    /// Row-buffer hit rate in percent over scheduled requests.
    pub fn row_hit_rate(&self) -> f64 {
        let total = self.rb_hits + self.rb_miss;
        if total == 0 {
            0.0
        } else {
            100.0 * self.rb_hits as f64 / total as f64
        }
    }

    /// Writes every statistic into `sink` under its report name.
    pub fn register(&self, sink: &mut dyn StatsSink) {
        sink.counter("mem_reads", self.mem_reads);
        sink.counter("mem_writes", self.mem_writes);
        sink.counter("rb_hits", self.rb_hits);
        sink.counter("rb_miss", self.rb_miss);
        sink.counter("starvation_precharges", self.starvation_precharges);
        sink.average("averageLatency", self.service_latency.average());
        sink.average("averageQueueLatency", self.queue_latency.average());
        sink.average("averageTotalLatency", self.total_latency.average());
        sink.counter("measuredLatencies", self.service_latency.count());
        sink.counter("measuredQueueLatencies", self.queue_latency.count());
        sink.counter("measuredTotalLatencies", self.total_latency.count());
        sink.counter("write_pauses", self.write_pauses);
        sink.counter("myCacheTries", self.cache_tries);
        sink.counter("myCacheHits", self.cache_hits);
        sink.counter("myCacheWrites", self.cache_writes);
    }

    /// Collects the statistics into a JSON object keyed by report name.
    pub fn to_value(&self) -> serde_json::Value {
        let mut sink = JsonSink::default();
        self.register(&mut sink);
        serde_json::Value::Object(sink.0)
    }

    /// Serialises the statistics as a pretty-printed JSON object keyed by report name.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` serialisation failures.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.to_value())
    }

    /// Prints the statistics report to stdout.
    pub fn print(&self) {
        println!("\n==========================================================");
        println!("MEMORY CONTROLLER STATISTICS");
        println!("==========================================================");
        println!("mem_reads                {}", self.mem_reads);
        println!("mem_writes               {}", self.mem_writes);
        println!("----------------------------------------------------------");
        println!("SCHEDULING");
        println!(
            "  rb_hits                {} ({:.2}%)",
            self.rb_hits,
            self.row_hit_rate()
        );
        println!("  rb_miss                {}", self.rb_miss);
        println!("  starvation_precharges  {}", self.starvation_precharges);
        println!("  write_pauses           {}", self.write_pauses);
        println!("----------------------------------------------------------");
        println!("FRONT-END CACHE");
        println!("  myCacheTries           {}", self.cache_tries);
        println!(
            "  myCacheHits            {} ({:.2}%)",
            self.cache_hits,
            self.cache_hit_rate()
        );
        println!("  myCacheWrites          {}", self.cache_writes);
        println!("----------------------------------------------------------");
        println!("LATENCY");
        println!(
            "  averageLatency         {:.4} ({} samples)",
            self.service_latency.average(),
            self.service_latency.count()
        );
        println!(
            "  averageQueueLatency    {:.4} ({} samples)",
            self.queue_latency.average(),
            self.queue_latency.count()
        );
        println!(
            "  averageTotalLatency    {:.4} ({} samples)",
            self.total_latency.average(),
            self.total_latency.count()
        );
        println!("==========================================================");
    }
}

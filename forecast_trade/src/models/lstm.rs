//! LSTM sequence regressor
//!
//! A single-layer LSTM reads a window of min-max scaled prices and a linear
//! head maps the final hidden state to the next scaled price. Training is
//! mini-batch Adam over shuffled windows with gradients from
//! back-propagation through time and global-norm clipping.

use crate::error::{ForecastError, Result};
use crate::models::{Forecast, ForecastModel, ModelKind, TrainedForecastModel};
use crate::split::Split;
use ndarray::{Array, Array1, Array2, Axis, Dimension, Zip};
use portfolio_trade::PriceSeries;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::Uniform;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use trade_math::scaling::MinMaxScaler;

const INPUT: usize = 0;
const FORGET: usize = 1;
const CELL: usize = 2;
const OUTPUT: usize = 3;

/// LSTM training settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LstmConfig {
    /// Number of past observations fed to the network
    pub window: usize,
    pub hidden_size: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Maximum global gradient norm
    pub gradient_clip: f64,
    /// Fixed seed for initialization and shuffling; entropy when absent
    pub seed: Option<u64>,
}

impl Default for LstmConfig {
    fn default() -> Self {
        Self {
            window: 60,
            hidden_size: 32,
            epochs: 20,
            batch_size: 32,
            learning_rate: 0.001,
            gradient_clip: 1.0,
            seed: None,
        }
    }
}

impl LstmConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window == 0 || self.hidden_size == 0 || self.epochs == 0 || self.batch_size == 0 {
            return Err(ForecastError::InvalidParameter(
                "LSTM window, hidden size, epochs and batch size must be positive".to_string(),
            ));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.gradient_clip.is_finite() && self.gradient_clip > 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Gradient clip must be positive, got {}",
                self.gradient_clip
            )));
        }
        Ok(())
    }
}

/// How multi-step predictions are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastMode {
    /// Every step is predicted from actual preceding observations
    Direct,
    /// Each prediction is fed back as input for the next step
    Recursive,
}

/// Fixed-size window that overwrites its oldest slot on push
#[derive(Debug, Clone, PartialEq)]
pub struct RollingWindow {
    slots: Vec<f64>,
    head: usize,
}

impl RollingWindow {
    pub fn new(values: &[f64]) -> Self {
        Self {
            slots: values.to_vec(),
            head: 0,
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.slots.is_empty() {
            return;
        }
        self.slots[self.head] = value;
        self.head = (self.head + 1) % self.slots.len();
    }

    /// Values from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.slots[self.head..]
            .iter()
            .chain(&self.slots[..self.head])
            .copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Weights of one gate; the input is a single scalar per step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Gate {
    w_x: Array1<f64>,
    w_h: Array2<f64>,
    b: Array1<f64>,
}

impl Gate {
    fn random(hidden: usize, bias: f64, rng: &mut StdRng) -> Self {
        let limit = (1.0 / hidden as f64).sqrt();
        let dist = Uniform::new(-limit, limit);

        Self {
            w_x: Array1::from_shape_fn(hidden, |_| rng.sample(dist)),
            w_h: Array2::from_shape_fn((hidden, hidden), |_| rng.sample(dist)),
            b: Array1::from_elem(hidden, bias),
        }
    }

    fn zeros(hidden: usize) -> Self {
        Self {
            w_x: Array1::zeros(hidden),
            w_h: Array2::zeros((hidden, hidden)),
            b: Array1::zeros(hidden),
        }
    }

    fn pre_activation(&self, x: f64, h: &Array1<f64>) -> Array1<f64> {
        &self.w_x * x + self.w_h.dot(h) + &self.b
    }

    fn accumulate(&mut self, dz: &Array1<f64>, x: f64, h_prev: &Array1<f64>) {
        self.w_x.scaled_add(x, dz);
        let outer = dz
            .view()
            .insert_axis(Axis(1))
            .dot(&h_prev.view().insert_axis(Axis(0)));
        self.w_h += &outer;
        self.b += dz;
    }

    fn squared_norm(&self) -> f64 {
        self.w_x.iter().chain(self.w_h.iter()).chain(self.b.iter()).map(|g| g * g).sum()
    }

    fn scale(&mut self, factor: f64) {
        self.w_x *= factor;
        self.w_h *= factor;
        self.b *= factor;
    }

    fn is_finite(&self) -> bool {
        self.w_x
            .iter()
            .chain(self.w_h.iter())
            .chain(self.b.iter())
            .all(|v| v.is_finite())
    }
}

/// All trainable parameters; also used for gradients and Adam moments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LstmParams {
    gates: [Gate; 4],
    w_out: Array1<f64>,
    b_out: f64,
}

/// Activations of one time step, kept for the backward pass
struct StepCache {
    x: f64,
    h_prev: Array1<f64>,
    c_prev: Array1<f64>,
    i: Array1<f64>,
    f: Array1<f64>,
    g: Array1<f64>,
    o: Array1<f64>,
    tanh_c: Array1<f64>,
    h: Array1<f64>,
    c: Array1<f64>,
}

fn sigmoid(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}

impl LstmParams {
    fn random(hidden: usize, rng: &mut StdRng) -> Self {
        let limit = (1.0 / hidden as f64).sqrt();
        let dist = Uniform::new(-limit, limit);

        Self {
            gates: [
                Gate::random(hidden, 0.0, rng),
                // Forget gate starts open
                Gate::random(hidden, 1.0, rng),
                Gate::random(hidden, 0.0, rng),
                Gate::random(hidden, 0.0, rng),
            ],
            w_out: Array1::from_shape_fn(hidden, |_| rng.sample(dist)),
            b_out: 0.0,
        }
    }

    fn zeros(hidden: usize) -> Self {
        Self {
            gates: [
                Gate::zeros(hidden),
                Gate::zeros(hidden),
                Gate::zeros(hidden),
                Gate::zeros(hidden),
            ],
            w_out: Array1::zeros(hidden),
            b_out: 0.0,
        }
    }

    fn hidden_size(&self) -> usize {
        self.w_out.len()
    }

    fn step(&self, x: f64, h_prev: Array1<f64>, c_prev: Array1<f64>) -> StepCache {
        let i = sigmoid(&self.gates[INPUT].pre_activation(x, &h_prev));
        let f = sigmoid(&self.gates[FORGET].pre_activation(x, &h_prev));
        let g = self.gates[CELL].pre_activation(x, &h_prev).mapv(f64::tanh);
        let o = sigmoid(&self.gates[OUTPUT].pre_activation(x, &h_prev));

        let c = &f * &c_prev + &i * &g;
        let tanh_c = c.mapv(f64::tanh);
        let h = &o * &tanh_c;

        StepCache {
            x,
            h_prev,
            c_prev,
            i,
            f,
            g,
            o,
            tanh_c,
            h,
            c,
        }
    }

    /// Scaled prediction for one input window
    fn predict(&self, inputs: impl IntoIterator<Item = f64>) -> f64 {
        let hidden = self.hidden_size();
        let mut h = Array1::zeros(hidden);
        let mut c = Array1::zeros(hidden);

        for x in inputs {
            let cache = self.step(x, h, c);
            h = cache.h;
            c = cache.c;
        }

        self.w_out.dot(&h) + self.b_out
    }

    /// Add the gradient of `0.5 * (prediction - target)^2` to `grads`
    ///
    /// Returns the squared error.
    fn accumulate_gradients(&self, inputs: &[f64], target: f64, grads: &mut LstmParams) -> f64 {
        let hidden = self.hidden_size();
        let mut caches: Vec<StepCache> = Vec::with_capacity(inputs.len());
        let mut h = Array1::zeros(hidden);
        let mut c = Array1::zeros(hidden);

        for &x in inputs {
            let cache = self.step(x, h.clone(), c.clone());
            h = cache.h.clone();
            c = cache.c.clone();
            caches.push(cache);
        }

        let prediction = self.w_out.dot(&h) + self.b_out;
        let dy = prediction - target;

        grads.w_out.scaled_add(dy, &h);
        grads.b_out += dy;

        let mut dh = &self.w_out * dy;
        let mut dc: Array1<f64> = Array1::zeros(hidden);

        for cache in caches.iter().rev() {
            let d_o = &dh * &cache.tanh_c;
            dc = dc + &dh * &cache.o * &cache.tanh_c.mapv(|t| 1.0 - t * t);

            let d_i = &dc * &cache.g;
            let d_g = &dc * &cache.i;
            let d_f = &dc * &cache.c_prev;

            let dz = [
                d_i * &cache.i.mapv(|v| v * (1.0 - v)),
                d_f * &cache.f.mapv(|v| v * (1.0 - v)),
                d_g * &cache.g.mapv(|v| 1.0 - v * v),
                d_o * &cache.o.mapv(|v| v * (1.0 - v)),
            ];

            let mut dh_prev = Array1::zeros(hidden);
            for (k, dz_k) in dz.iter().enumerate() {
                grads.gates[k].accumulate(dz_k, cache.x, &cache.h_prev);
                dh_prev += &self.gates[k].w_h.t().dot(dz_k);
            }

            dh = dh_prev;
            dc = &dc * &cache.f;
        }

        dy * dy
    }

    fn squared_norm(&self) -> f64 {
        self.gates.iter().map(Gate::squared_norm).sum::<f64>()
            + self.w_out.iter().map(|g| g * g).sum::<f64>()
            + self.b_out * self.b_out
    }

    fn scale(&mut self, factor: f64) {
        for gate in self.gates.iter_mut() {
            gate.scale(factor);
        }
        self.w_out *= factor;
        self.b_out *= factor;
    }

    fn is_finite(&self) -> bool {
        self.gates.iter().all(Gate::is_finite)
            && self.w_out.iter().all(|v| v.is_finite())
            && self.b_out.is_finite()
    }
}

/// Adam optimizer state
struct Adam {
    m: LstmParams,
    v: LstmParams,
    t: i32,
    learning_rate: f64,
}

const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const EPSILON: f64 = 1e-8;

fn adam_update<D: Dimension>(
    param: &mut Array<f64, D>,
    grad: &Array<f64, D>,
    m: &mut Array<f64, D>,
    v: &mut Array<f64, D>,
    step_size: f64,
) {
    Zip::from(param)
        .and(grad)
        .and(m)
        .and(v)
        .for_each(|p, &g, m, v| adam_scalar(p, g, m, v, step_size));
}

fn adam_scalar(p: &mut f64, g: f64, m: &mut f64, v: &mut f64, step_size: f64) {
    *m = BETA1 * *m + (1.0 - BETA1) * g;
    *v = BETA2 * *v + (1.0 - BETA2) * g * g;
    *p -= step_size * *m / (v.sqrt() + EPSILON);
}

impl Adam {
    fn new(hidden: usize, learning_rate: f64) -> Self {
        Self {
            m: LstmParams::zeros(hidden),
            v: LstmParams::zeros(hidden),
            t: 0,
            learning_rate,
        }
    }

    fn step(&mut self, params: &mut LstmParams, grads: &LstmParams) {
        self.t += 1;
        let step_size = self.learning_rate * (1.0 - BETA2.powi(self.t)).sqrt()
            / (1.0 - BETA1.powi(self.t));

        for k in 0..4 {
            let (p, g) = (&mut params.gates[k], &grads.gates[k]);
            let (m, v) = (&mut self.m.gates[k], &mut self.v.gates[k]);
            adam_update(&mut p.w_x, &g.w_x, &mut m.w_x, &mut v.w_x, step_size);
            adam_update(&mut p.w_h, &g.w_h, &mut m.w_h, &mut v.w_h, step_size);
            adam_update(&mut p.b, &g.b, &mut m.b, &mut v.b, step_size);
        }
        adam_update(
            &mut params.w_out,
            &grads.w_out,
            &mut self.m.w_out,
            &mut self.v.w_out,
            step_size,
        );
        adam_scalar(
            &mut params.b_out,
            grads.b_out,
            &mut self.m.b_out,
            &mut self.v.b_out,
            step_size,
        );
    }
}

/// LSTM regressor over windows of scaled prices
#[derive(Debug, Clone, Default)]
pub struct LstmRegressor {
    config: LstmConfig,
}

/// Trained LSTM with the scaler fitted on its training series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedLstm {
    asset: String,
    config: LstmConfig,
    params: LstmParams,
    scaler: MinMaxScaler,
    loss_history: Vec<f64>,
}

impl LstmRegressor {
    pub fn new(config: LstmConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LstmConfig {
        &self.config
    }
}

impl ForecastModel for LstmRegressor {
    type Trained = TrainedLstm;

    fn train(&self, series: &PriceSeries) -> Result<TrainedLstm> {
        self.config.validate()?;

        let window = self.config.window;
        if series.len() < window + 1 {
            return Err(ForecastError::InsufficientHistory {
                required: window + 1,
                available: series.len(),
            });
        }

        let scaler = MinMaxScaler::fit(series.prices())?;
        let scaled = scaler.transform_all(series.prices());

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut params = LstmParams::random(self.config.hidden_size, &mut rng);
        let mut adam = Adam::new(self.config.hidden_size, self.config.learning_rate);
        let mut order: Vec<usize> = (0..scaled.len() - window).collect();
        let mut loss_history = Vec::with_capacity(self.config.epochs);

        info!(
            "Training LSTM on {} ({} windows of {}, {} epochs)",
            series.asset(),
            order.len(),
            window,
            self.config.epochs
        );

        for epoch in 0..self.config.epochs {
            order.shuffle(&mut rng);
            let mut epoch_loss = 0.0;

            for batch in order.chunks(self.config.batch_size) {
                let mut grads = LstmParams::zeros(self.config.hidden_size);
                for &start in batch {
                    epoch_loss += params.accumulate_gradients(
                        &scaled[start..start + window],
                        scaled[start + window],
                        &mut grads,
                    );
                }

                grads.scale(1.0 / batch.len() as f64);
                let norm = grads.squared_norm().sqrt();
                if norm > self.config.gradient_clip {
                    grads.scale(self.config.gradient_clip / norm);
                }

                adam.step(&mut params, &grads);
            }

            let mse = epoch_loss / order.len() as f64;
            debug!("LSTM epoch {}/{}: loss {:.6}", epoch + 1, self.config.epochs, mse);
            loss_history.push(mse);
        }

        if !params.is_finite() {
            return Err(ForecastError::Fit(format!(
                "LSTM training on {} diverged",
                series.asset()
            )));
        }

        Ok(TrainedLstm {
            asset: series.asset().to_string(),
            config: self.config,
            params,
            scaler,
            loss_history,
        })
    }

    fn name(&self) -> &str {
        "LSTM"
    }
}

impl TrainedLstm {
    pub fn window(&self) -> usize {
        self.config.window
    }

    pub fn config(&self) -> &LstmConfig {
        &self.config
    }

    /// Scaler fitted on the training series
    pub fn scaler(&self) -> &MinMaxScaler {
        &self.scaler
    }

    /// Mean squared error (scaled units) of each training epoch
    pub fn loss_history(&self) -> &[f64] {
        &self.loss_history
    }

    /// Predict `horizon` prices from `seed_window`
    ///
    /// In [`ForecastMode::Direct`] the last `horizon` values of `seed_window`
    /// are each predicted from the `window` actual values before them. In
    /// [`ForecastMode::Recursive`] the forecast continues past the end of
    /// `seed_window`, feeding predictions back in.
    pub fn forecast(
        &self,
        seed_window: &[f64],
        horizon: usize,
        mode: ForecastMode,
    ) -> Result<Vec<f64>> {
        if horizon == 0 {
            return Err(ForecastError::Forecast(
                "Horizon must be at least 1".to_string(),
            ));
        }

        let window = self.config.window;
        let required = match mode {
            ForecastMode::Direct => window + horizon,
            ForecastMode::Recursive => window,
        };
        if seed_window.len() < required {
            return Err(ForecastError::InsufficientHistory {
                required,
                available: seed_window.len(),
            });
        }

        let scaled = self.scaler.transform_all(seed_window);

        let predictions = match mode {
            ForecastMode::Direct => {
                let first = scaled.len() - horizon;
                (first..scaled.len())
                    .map(|j| self.params.predict(scaled[j - window..j].iter().copied()))
                    .collect::<Vec<f64>>()
            }
            ForecastMode::Recursive => {
                let mut buffer = RollingWindow::new(&scaled[scaled.len() - window..]);
                let mut out = Vec::with_capacity(horizon);
                for _ in 0..horizon {
                    let next = self.params.predict(buffer.iter());
                    buffer.push(next);
                    out.push(next);
                }
                out
            }
        };

        Ok(predictions
            .into_iter()
            .map(|p| self.scaler.inverse_transform(p))
            .collect())
    }
}

impl TrainedForecastModel for TrainedLstm {
    fn kind(&self) -> ModelKind {
        ModelKind::Sequence
    }

    fn name(&self) -> String {
        format!(
            "LSTM(window={}, hidden={})",
            self.config.window, self.config.hidden_size
        )
    }

    /// Direct predictions of the test period from actual observations
    fn predict_test(&self, split: &Split) -> Result<Vec<f64>> {
        let window = self.config.window;
        let train = split.train.prices();
        if train.len() < window {
            return Err(ForecastError::InsufficientHistory {
                required: window,
                available: train.len(),
            });
        }

        let mut seed = train[train.len() - window..].to_vec();
        seed.extend_from_slice(split.test.prices());

        self.forecast(&seed, split.test.len(), ForecastMode::Direct)
    }

    fn forecast_future(&self, history: &PriceSeries, horizon: usize) -> Result<Forecast> {
        let values = self.forecast(history.prices(), horizon, ForecastMode::Recursive)?;
        Forecast::continuing(history, self.name(), values)
    }
}
